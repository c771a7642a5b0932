//! Manual tone and color adjustments.
//!
//! Adjustments run on an f32 working copy of the RGB buffer and are applied
//! in a fixed order — exposure, contrast, saturation, vibrance, temperature,
//! tint, then the combined shadows/highlights/whites/blacks tone-curve pass.
//! Each stage is skipped when its parameter is neutral, and the buffer is
//! clamped back into [0, 255] after every stage that can leave it.
//!
//! Transparency is never touched: [`apply`] splits alpha off before
//! adjusting and reattaches it unchanged.

use crate::imaging::auto_tone;
use crate::settings::ToneSettings;
use image::{DynamicImage, RgbImage, RgbaImage};

// ITU-R 601-2 luma weights, the grayscale reference for saturation blending.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Adjust an image, preserving any alpha channel untouched.
///
/// Dispatches to the automatic pipeline when `auto_tone` is set, otherwise
/// runs the manual stages.
pub fn apply(image: DynamicImage, tone: &ToneSettings) -> DynamicImage {
    match image {
        DynamicImage::ImageRgba8(rgba) => {
            let (rgb, alpha) = split_alpha(&rgba);
            DynamicImage::ImageRgba8(merge_alpha(&run(rgb, tone), &alpha))
        }
        other => DynamicImage::ImageRgb8(run(other.to_rgb8(), tone)),
    }
}

fn run(rgb: RgbImage, tone: &ToneSettings) -> RgbImage {
    if tone.auto_tone {
        auto_tone::apply(rgb)
    } else {
        adjust_manual(rgb, tone)
    }
}

/// Run the manual adjustment stages over an opaque RGB image.
pub fn adjust_manual(image: RgbImage, tone: &ToneSettings) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut buf: Vec<f32> = image.into_raw().iter().map(|&v| v as f32).collect();

    if tone.exposure != 0.0 {
        scale_all(&mut buf, 1.0 + tone.exposure * 0.5);
    }
    if tone.contrast != 0.0 {
        apply_contrast(&mut buf, (1.0 + tone.contrast / 100.0).max(0.1));
    }
    if tone.saturation != 0.0 {
        apply_saturation(&mut buf, (1.0 + tone.saturation / 100.0).max(0.0));
    }
    if tone.vibrance != 0.0 {
        // A second, gentler saturation pass at half strength.
        apply_saturation(&mut buf, 1.0 + tone.vibrance / 200.0);
    }
    if tone.temperature != 0.0 {
        // Warming shifts red up and blue down; negative values invert.
        let t = tone.temperature / 100.0;
        scale_channel(&mut buf, 0, 1.0 + t * 0.3);
        scale_channel(&mut buf, 2, 1.0 - t * 0.3);
    }
    if tone.tint != 0.0 {
        scale_channel(&mut buf, 1, 1.0 + tone.tint / 100.0 * 0.3);
    }
    if tone.shadows != 0.0 || tone.highlights != 0.0 || tone.whites != 0.0 || tone.blacks != 0.0 {
        apply_tone_curve(&mut buf, tone);
    }

    buf_to_image(buf, w, h)
}

// =============================================================================
// Stage operators — shared with the automatic pipeline where noted.
// =============================================================================

/// Multiply every channel value by `factor` (exposure).
pub(crate) fn scale_all(buf: &mut [f32], factor: f32) {
    for v in buf.iter_mut() {
        *v = (*v * factor).clamp(0.0, 255.0);
    }
}

/// Multiply one channel of every pixel by `factor` (temperature/tint).
fn scale_channel(buf: &mut [f32], channel: usize, factor: f32) {
    for px in buf.chunks_exact_mut(3) {
        px[channel] = (px[channel] * factor).clamp(0.0, 255.0);
    }
}

/// Blend every channel against the image's mean luma.
///
/// Factor 1.0 is the identity; values above it push pixels away from the
/// mean, values below pull them toward it.
pub(crate) fn apply_contrast(buf: &mut [f32], factor: f32) {
    let mean = mean_luma(buf);
    for v in buf.iter_mut() {
        *v = (mean + (*v - mean) * factor).clamp(0.0, 255.0);
    }
}

/// Blend every pixel against its own luma. Factor 0 yields grayscale,
/// 1.0 the identity.
fn apply_saturation(buf: &mut [f32], factor: f32) {
    for px in buf.chunks_exact_mut(3) {
        let gray = px[0] * LUMA_R + px[1] * LUMA_G + px[2] * LUMA_B;
        for v in px.iter_mut() {
            *v = (gray + (*v - gray) * factor).clamp(0.0, 255.0);
        }
    }
}

/// Combined shadows/highlights/whites/blacks pass.
///
/// Four disjoint luminosity masks, each a squared falloff from its
/// threshold, are scaled by their parameters and added to every channel.
fn apply_tone_curve(buf: &mut [f32], tone: &ToneSettings) {
    for px in buf.chunks_exact_mut(3) {
        let l = (px[0] + px[1] + px[2]) / (3.0 * 255.0);
        let mut delta = 0.0;

        if tone.shadows != 0.0 {
            let m = (1.0 - l / 0.3).max(0.0);
            delta += m * m * (tone.shadows / 100.0 * 50.0);
        }
        if tone.highlights != 0.0 {
            let m = ((l - 0.7) / 0.3).max(0.0);
            delta += m * m * (tone.highlights / 100.0 * 50.0);
        }
        if tone.whites != 0.0 {
            let m = ((l - 0.85) / 0.15).max(0.0);
            delta += m * m * (tone.whites / 100.0 * 30.0);
        }
        if tone.blacks != 0.0 {
            let m = (1.0 - l / 0.15).max(0.0);
            delta += m * m * (tone.blacks / 100.0 * 30.0);
        }

        for v in px.iter_mut() {
            *v = (*v + delta).clamp(0.0, 255.0);
        }
    }
}

/// Mean per-pixel luminosity of the working buffer, in [0, 255].
pub(crate) fn mean_luma(buf: &[f32]) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    let sum: f64 = buf
        .chunks_exact(3)
        .map(|px| ((px[0] + px[1] + px[2]) / 3.0) as f64)
        .sum();
    (sum / (buf.len() / 3) as f64) as f32
}

pub(crate) fn buf_to_image(buf: Vec<f32>, w: u32, h: u32) -> RgbImage {
    let raw: Vec<u8> = buf.iter().map(|&v| v.clamp(0.0, 255.0) as u8).collect();
    RgbImage::from_raw(w, h, raw).expect("buffer size matches dimensions")
}

fn split_alpha(rgba: &RgbaImage) -> (RgbImage, Vec<u8>) {
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    let mut alpha = Vec::with_capacity((rgba.width() * rgba.height()) as usize);
    for (src, dst) in rgba.pixels().zip(rgb.pixels_mut()) {
        dst.0 = [src[0], src[1], src[2]];
        alpha.push(src[3]);
    }
    (rgb, alpha)
}

fn merge_alpha(rgb: &RgbImage, alpha: &[u8]) -> RgbaImage {
    let mut rgba = RgbaImage::new(rgb.width(), rgb.height());
    for ((src, &a), dst) in rgb.pixels().zip(alpha.iter()).zip(rgba.pixels_mut()) {
        dst.0 = [src[0], src[1], src[2], a];
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    fn solid(w: u32, h: u32, px: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(px))
    }

    fn tone(f: impl FnOnce(&mut ToneSettings)) -> ToneSettings {
        let mut t = ToneSettings::default();
        f(&mut t);
        t
    }

    #[test]
    fn neutral_settings_change_nothing() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 31) as u8, (y * 31) as u8, 128]));
        let out = adjust_manual(img.clone(), &ToneSettings::default());
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn positive_exposure_multiplies_brightness() {
        // exposure 1.0 → factor 1.5
        let out = adjust_manual(solid(2, 2, [100, 60, 20]), &tone(|t| t.exposure = 1.0));
        assert_eq!(out[(0, 0)], Rgb([150, 90, 30]));
    }

    #[test]
    fn exposure_clamps_at_white() {
        let out = adjust_manual(solid(1, 1, [200, 200, 200]), &tone(|t| t.exposure = 2.0));
        assert_eq!(out[(0, 0)], Rgb([255, 255, 255]));
    }

    #[test]
    fn contrast_spreads_values_around_the_mean() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([50, 50, 50]) } else { Rgb([150, 150, 150]) }
        });
        // mean luma = 100, factor 1.5 → 25 and 175
        let out = adjust_manual(img, &tone(|t| t.contrast = 50.0));
        assert_eq!(out[(0, 0)], Rgb([25, 25, 25]));
        assert_eq!(out[(1, 0)], Rgb([175, 175, 175]));
    }

    #[test]
    fn negative_contrast_factor_floors_at_tenth() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) }
        });
        // contrast -100 would zero the factor; it floors at 0.1 instead
        let out = adjust_manual(img, &tone(|t| t.contrast = -100.0));
        let spread = out[(1, 0)][0] as i32 - out[(0, 0)][0] as i32;
        assert!(spread > 0 && spread <= 21, "spread was {spread}");
    }

    #[test]
    fn full_desaturation_yields_gray() {
        let out = adjust_manual(solid(2, 2, [200, 40, 90]), &tone(|t| t.saturation = -100.0));
        let px = out[(0, 0)];
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn vibrance_is_half_strength_saturation() {
        let src = solid(2, 2, [200, 40, 90]);
        let vib = adjust_manual(src.clone(), &tone(|t| t.vibrance = 50.0));
        let sat = adjust_manual(src.clone(), &tone(|t| t.saturation = 25.0));
        assert_eq!(vib.as_raw(), sat.as_raw());
    }

    #[test]
    fn warming_raises_red_and_lowers_blue() {
        let out = adjust_manual(solid(1, 1, [100, 100, 100]), &tone(|t| t.temperature = 100.0));
        let px = out[(0, 0)];
        assert_eq!(px[0], 130);
        assert_eq!(px[1], 100);
        assert_eq!(px[2], 70);
    }

    #[test]
    fn cooling_inverts_the_shift() {
        let out = adjust_manual(solid(1, 1, [100, 100, 100]), &tone(|t| t.temperature = -100.0));
        let px = out[(0, 0)];
        assert_eq!(px[0], 70);
        assert_eq!(px[2], 130);
    }

    #[test]
    fn tint_shifts_green_only() {
        let out = adjust_manual(solid(1, 1, [100, 100, 100]), &tone(|t| t.tint = 100.0));
        assert_eq!(out[(0, 0)], Rgb([100, 130, 100]));
    }

    #[test]
    fn shadow_lift_targets_dark_pixels_only() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([10, 10, 10]) } else { Rgb([200, 200, 200]) }
        });
        let out = adjust_manual(img, &tone(|t| t.shadows = 100.0));
        assert!(out[(0, 0)][0] > 10);
        assert_eq!(out[(1, 0)], Rgb([200, 200, 200]));
    }

    #[test]
    fn shadow_mask_strength_at_black() {
        // L = 0 → mask 1.0 → +50 on every channel at shadows = 100
        let out = adjust_manual(solid(1, 1, [0, 0, 0]), &tone(|t| t.shadows = 100.0));
        assert_eq!(out[(0, 0)], Rgb([50, 50, 50]));
    }

    #[test]
    fn negative_highlights_recover_bright_pixels() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([40, 40, 40]) } else { Rgb([255, 255, 255]) }
        });
        let out = adjust_manual(img, &tone(|t| t.highlights = -100.0));
        assert_eq!(out[(0, 0)], Rgb([40, 40, 40]));
        assert!(out[(1, 0)][0] < 255);
    }

    #[test]
    fn whites_and_blacks_are_narrower_than_highlights_and_shadows() {
        // L = 0.2 sits inside the shadows band but outside the blacks band
        let out_blacks = adjust_manual(solid(1, 1, [51, 51, 51]), &tone(|t| t.blacks = 100.0));
        assert_eq!(out_blacks[(0, 0)], Rgb([51, 51, 51]));

        let out_shadows = adjust_manual(solid(1, 1, [51, 51, 51]), &tone(|t| t.shadows = 100.0));
        assert!(out_shadows[(0, 0)][0] > 51);
    }

    #[test]
    fn alpha_survives_adjustment_unchanged() {
        let rgba = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 77]));
        let out = apply(
            DynamicImage::ImageRgba8(rgba),
            &tone(|t| t.exposure = 1.0),
        );
        let out = out.to_rgba8();
        assert_eq!(out[(0, 0)], Rgba([150, 150, 150, 77]));
    }
}
