//! Pixel-level operations behind the conversion pipeline.
//!
//! | Operation | Module / crate |
//! |---|---|
//! | **Decode** (JPEG, PNG, BMP, TIFF, GIF) | [`codec`], `image` crate |
//! | **Encode → WebP** (quality/lossless/method) | [`codec`], `webp` (libwebp) |
//! | **Alpha policy, grayscale companion** | [`codec`] |
//! | **Resize / crop / uniform-box analysis** | [`geometry`], Lanczos3 |
//! | **Manual tone adjustments** | [`tone`] |
//! | **Auto tone** | [`auto_tone`] |
//!
//! Geometry and tone functions are pure image-to-image transforms; only
//! [`codec`] touches the filesystem.

pub mod auto_tone;
pub mod codec;
pub mod geometry;
pub mod tone;

pub use codec::{CodecError, EncodeOptions};
