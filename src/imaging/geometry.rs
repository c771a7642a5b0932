//! Geometric operations: proportional resize, orientation cropping, and
//! folder-wide uniform-dimension analysis.
//!
//! The dimension math ([`uniform_box`], [`median`]) is split from the image
//! operations so it can be unit tested without decoding a single pixel. The
//! analysis pass reads image headers only (`image::image_dimensions`), never
//! full frames.

use crate::imaging::codec;
use crate::settings::Orientation;
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;
use walkdir::WalkDir;

/// Resize to `target_width` preserving aspect ratio (Lanczos3).
///
/// A no-op when the image already has the target width, so re-running a
/// conversion over its own output is pixel-identical.
pub fn resize_to_width(image: DynamicImage, target_width: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    if w == target_width {
        return image;
    }
    let new_h = (target_width as f64 * h as f64 / w as f64).round().max(1.0) as u32;
    image.resize_exact(target_width, new_h, FilterType::Lanczos3)
}

/// Center-crop a portrait image to a square against the target width.
///
/// Applies after [`resize_to_width`]: when the resized height still exceeds
/// the target width, the excess is split between top and bottom (the bottom
/// taking the odd row). Landscape images pass through untouched.
pub fn crop_vertical_to_landscape(image: DynamicImage, target_width: u32) -> DynamicImage {
    let h = image.height();
    if h <= target_width {
        return image;
    }
    let crop_top = (h - target_width) / 2;
    image.crop_imm(0, crop_top, image.width(), target_width)
}

/// Cover-resize then center-crop to exactly `(target_w, target_h)`.
///
/// The image is scaled up until it covers the target box on the binding
/// axis, then the excess on the other axis is cropped away. Never
/// letterboxes.
pub fn crop_to_uniform(image: &DynamicImage, target_w: u32, target_h: u32) -> DynamicImage {
    image.resize_to_fill(target_w, target_h, FilterType::Lanczos3)
}

/// Analyze every supported image under `source` and derive one target box
/// for the whole batch.
///
/// Each image contributes its `height/width` ratio (header read only;
/// unreadable files are skipped). The median ratio — robust against a few
/// panoramas or scans in an otherwise uniform folder — is then shaped into a
/// box by [`uniform_box`]. A folder with no readable image falls back to a
/// `target_width` square.
pub fn compute_uniform_dimensions(
    source: &Path,
    target_width: u32,
    orientation: Orientation,
) -> (u32, u32) {
    let mut ratios: Vec<f64> = WalkDir::new(source)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && codec::is_supported(e.path()))
        .filter_map(|e| image::image_dimensions(e.path()).ok())
        .filter(|&(w, _)| w > 0)
        .map(|(w, h)| h as f64 / w as f64)
        .collect();
    ratios.sort_by(|a, b| a.total_cmp(b));

    uniform_box(median(&ratios), target_width, orientation)
}

/// Median of an ascending-sorted slice; mean of the middle two for even
/// lengths.
fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Shape a median aspect ratio into the batch target box.
///
/// Horizontal guarantees landscape-or-square: a ratio that would produce a
/// portrait box is inverted, and forced square if even the inverse is taller
/// than wide. Vertical guarantees portrait: a ratio that is not taller than
/// wide falls back to 2:3.
pub fn uniform_box(
    median_ratio: Option<f64>,
    target_width: u32,
    orientation: Orientation,
) -> (u32, u32) {
    let w = target_width as f64;
    let Some(ratio) = median_ratio else {
        return (target_width, target_width);
    };

    let height = match orientation {
        Orientation::Horizontal => {
            let mut h = (w * ratio).round();
            if h > w {
                h = (w / ratio).round();
            }
            if h > w {
                h = w;
            }
            h
        }
        Orientation::Vertical => {
            let h = (w * ratio).round();
            if h > w { h } else { (w * 1.5).round() }
        }
    };

    (target_width, height.max(1.0) as u32)
}
