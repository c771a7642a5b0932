//! Decode/encode boundary around the `image` and `webp` crates.
//!
//! Everything is statically linked; decoding uses the `image` crate's pure
//! Rust decoders, encoding goes through libwebp because the `image` crate's
//! WebP encoder is lossless-only and exposes no method (effort) control.
//!
//! This module also owns the two pixel-format policies of the pipeline:
//! alpha handling (preserve vs flatten onto white) and grayscale companion
//! derivation. Both run *after* geometry so crops never resample an already
//! flattened image.

use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("WebP encode failed: {0}")]
    Encode(String),
}

/// Input extensions with decoders compiled in (see `Cargo.toml` features).
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif"];

/// Returns the set of image file extensions the converter accepts as input.
pub fn supported_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}

/// Case-insensitive extension check against the supported input formats.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| ext.eq_ignore_ascii_case(s))
        })
}

/// Load and decode an image from disk.
pub fn decode(path: &Path) -> Result<DynamicImage, CodecError> {
    ImageReader::open(path)
        .map_err(CodecError::Io)?
        .decode()
        .map_err(|e| CodecError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// WebP encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Quality 0-100 (lossy); steers effort when lossless.
    pub quality: u8,
    pub lossless: bool,
    /// Encoder method 0-6, higher = better compression, slower.
    pub method: u8,
}

/// Encode an image as WebP at `path`. Returns the number of bytes written.
///
/// RGB8 and RGBA8 buffers are fed to libwebp directly; every other pixel
/// format (grayscale companions included) is expanded first, keeping alpha
/// when the source carries it.
pub fn encode_webp(
    image: &DynamicImage,
    path: &Path,
    opts: EncodeOptions,
) -> Result<u64, CodecError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| CodecError::Encode("invalid libwebp configuration".to_string()))?;
    config.quality = opts.quality.min(100) as f32;
    config.lossless = opts.lossless as i32;
    config.method = opts.method.min(6) as i32;

    let memory = match image {
        DynamicImage::ImageRgb8(buf) => {
            webp::Encoder::from_rgb(buf.as_raw(), buf.width(), buf.height())
                .encode_advanced(&config)
        }
        DynamicImage::ImageRgba8(buf) => {
            webp::Encoder::from_rgba(buf.as_raw(), buf.width(), buf.height())
                .encode_advanced(&config)
        }
        other if other.color().has_alpha() => {
            let buf = other.to_rgba8();
            webp::Encoder::from_rgba(buf.as_raw(), buf.width(), buf.height())
                .encode_advanced(&config)
        }
        other => {
            let buf = other.to_rgb8();
            webp::Encoder::from_rgb(buf.as_raw(), buf.width(), buf.height())
                .encode_advanced(&config)
        }
    }
    .map_err(|e| CodecError::Encode(format!("{e:?}")))?;

    std::fs::write(path, &*memory)?;
    Ok(memory.len() as u64)
}

/// Normalize a decoded image according to the alpha policy.
///
/// Images with transparency keep it (RGBA8) when `preserve_alpha` is set and
/// are composited onto an opaque white background (RGB8) otherwise. Images
/// without transparency are normalized to RGB8.
pub fn apply_alpha_policy(image: DynamicImage, preserve_alpha: bool) -> DynamicImage {
    if image.color().has_alpha() {
        if preserve_alpha {
            DynamicImage::ImageRgba8(image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(flatten_onto_white(&image))
        }
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Composite a transparent image over an opaque white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = src[3] as f32 / 255.0;
        for c in 0..3 {
            dst[c] = (src[c] as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        }
    }
    out
}

/// Derive the luminance-only companion of a finalized color image.
///
/// Alpha, if the color image still carries one, is preserved unchanged.
pub fn grayscale_companion(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageLumaA8(image.to_luma_alpha8())
    } else {
        DynamicImage::ImageLuma8(image.to_luma8())
    }
}
