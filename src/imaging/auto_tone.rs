//! Automatic tone correction.
//!
//! A fixed pipeline, not configurable: percentile contrast stretch, global
//! contrast boost, highlight recovery, shadow lift, damped white balance,
//! saturation-aware vibrance, and a final exposure correction. The constants
//! are tuned empirically; the stretch ignores the outermost percentile on
//! each end so single blown or crushed pixels cannot pin the histogram.
//!
//! Every stage runs unconditionally, in order, on an f32 working buffer that
//! is clamped back into [0, 255] after each stage.

use crate::imaging::tone::{apply_contrast, buf_to_image, mean_luma, scale_all};
use image::RgbImage;

pub fn apply(image: RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut buf: Vec<f32> = image.into_raw().iter().map(|&v| v as f32).collect();

    stretch_channels(&mut buf);
    apply_contrast(&mut buf, 1.15);
    recover_highlights(&mut buf);
    lift_shadows(&mut buf);
    balance_white(&mut buf);
    boost_vibrance(&mut buf);
    correct_exposure(&mut buf);

    buf_to_image(buf, w, h)
}

/// Per-channel histogram stretch between the 1st and 99th percentiles.
fn stretch_channels(buf: &mut [f32]) {
    for channel in 0..3 {
        let mut values: Vec<f32> = buf[channel..].iter().step_by(3).copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let lo = percentile(&values, 1.0);
        let hi = percentile(&values, 99.0);
        if hi <= lo {
            continue;
        }
        for v in buf[channel..].iter_mut().step_by(3) {
            *v = ((*v - lo) / (hi - lo) * 255.0).clamp(0.0, 255.0);
        }
    }
}

/// Nearest-rank percentile of an ascending-sorted slice.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f32 * p / 100.0).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Pull the brightest pixels down: subtract `25·mask` where the mask ramps
/// from L = 0.85 to 1.0.
fn recover_highlights(buf: &mut [f32]) {
    mask_offset(buf, |l| -25.0 * ((l - 0.85) / 0.15).max(0.0).powf(1.5));
}

/// Open the darkest pixels up: add `30·mask` where the mask ramps from
/// L = 0.25 down to 0.
fn lift_shadows(buf: &mut [f32]) {
    mask_offset(buf, |l| 30.0 * (1.0 - l / 0.25).max(0.0).powf(1.5));
}

fn mask_offset(buf: &mut [f32], offset: impl Fn(f32) -> f32) {
    for px in buf.chunks_exact_mut(3) {
        let l = (px[0] + px[1] + px[2]) / (3.0 * 255.0);
        let delta = offset(l);
        if delta != 0.0 {
            for v in px.iter_mut() {
                *v = (*v + delta).clamp(0.0, 255.0);
            }
        }
    }
}

/// Neutralize color casts from the mid-tones (0.3 < L < 0.7).
///
/// Each channel is scaled 30% of the way toward the mid-tone gray average.
/// The damping avoids overcorrecting scenes that are legitimately warm or
/// cool. Skipped when there are no mid-tone pixels or a channel average is
/// zero.
fn balance_white(buf: &mut [f32]) {
    let mut sums = [0.0f64; 3];
    let mut count = 0u64;
    for px in buf.chunks_exact(3) {
        let l = (px[0] + px[1] + px[2]) / (3.0 * 255.0);
        if l > 0.3 && l < 0.7 {
            for c in 0..3 {
                sums[c] += px[c] as f64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return;
    }

    let avgs = sums.map(|s| (s / count as f64) as f32);
    if avgs.iter().any(|&a| a == 0.0) {
        return;
    }
    let target = (avgs[0] + avgs[1] + avgs[2]) / 3.0;
    let factors = avgs.map(|avg| 1.0 + (target / avg - 1.0) * 0.3);

    for px in buf.chunks_exact_mut(3) {
        for c in 0..3 {
            px[c] = (px[c] * factors[c]).clamp(0.0, 255.0);
        }
    }
}

/// Boost saturation inversely to how saturated a pixel already is.
///
/// Runs in HSV: `boost = (1 − S/255)·0.4`, so gray-ish pixels gain the most
/// and already-vivid pixels are left nearly alone.
fn boost_vibrance(buf: &mut [f32]) {
    for px in buf.chunks_exact_mut(3) {
        let (hue, sat, val) = rgb_to_hsv(px[0], px[1], px[2]);
        let boost = (1.0 - sat / 255.0) * 0.4;
        let sat = (sat * (1.0 + boost)).clamp(0.0, 255.0);
        let (r, g, b) = hsv_to_rgb(hue, sat, val);
        px[0] = r.clamp(0.0, 255.0);
        px[1] = g.clamp(0.0, 255.0);
        px[2] = b.clamp(0.0, 255.0);
    }
}

/// Final global exposure nudge from the mean brightness.
///
/// Brightens when the mean lands below 0.45, darkens above 0.65, and leaves
/// the window between untouched.
fn correct_exposure(buf: &mut [f32]) {
    let mean = mean_luma(buf) / 255.0;
    if mean < 0.45 {
        scale_all(buf, 1.0 + (0.5 - mean) * 0.6);
    } else if mean > 0.65 {
        scale_all(buf, 1.0 - (mean - 0.6) * 0.4);
    }
}

// =============================================================================
// HSV round-trip (S and V on the 0-255 scale, H in degrees)
// =============================================================================

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let sat = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    (hue, sat, max)
}

fn hsv_to_rgb(hue: f32, sat: f32, val: f32) -> (f32, f32, f32) {
    let s = sat / 255.0;
    let c = val * s;
    let hp = hue / 60.0;
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
    let m = val - c;

    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}
