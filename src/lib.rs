//! # towebp
//!
//! Bulk image to WebP converter. Point it at a folder (or a single file) and
//! it mirrors the directory tree into a `_WebP` sibling, converting every
//! supported image (JPEG, PNG, BMP, TIFF, GIF) and copying everything else
//! verbatim.
//!
//! # Pipeline
//!
//! Every image passes through the same fixed stages:
//!
//! ```text
//! decode → geometry (resize / uniform crop) → alpha policy → tone → WebP
//! ```
//!
//! A batch run adds two phases up front: a recursive pre-count so progress
//! fractions are accurate from the first file, and — when uniform sizing is
//! on — a dimension-analysis pass that derives one target box for the whole
//! folder from the median aspect ratio.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`settings`] | Typed run parameters with documented defaults |
//! | [`convert`] | The engine — mirroring walk, progress, cancellation, result aggregation |
//! | [`imaging`] | Pixel work: codec boundary, geometry, manual and automatic tone |
//! | [`naming`] | Collision-free `_WebP` / `_bw` output naming |
//! | [`output`] | CLI text formatting and the JSON run report |
//!
//! # Design Decisions
//!
//! ## libwebp for Encoding
//!
//! Decoding uses the `image` crate's pure Rust decoders, but encoding goes
//! through the `webp` crate (libwebp): the `image` crate's WebP encoder is
//! lossless-only and exposes neither a quality setting nor the method
//! (effort) level, and both are part of the converter's surface.
//!
//! ## Sequential by Design
//!
//! One worker walks the tree and converts files in order. There is no
//! internal parallelism, no locking, and exactly one cross-thread value: the
//! cooperative [`CancelFlag`](convert::CancelFlag). Callers that need a
//! responsive UI run the whole conversion on a worker thread and relay
//! progress events from the callback; cancellation lets the in-flight file
//! finish and returns a partial, accurately-counted result.
//!
//! ## Batches Don't Break
//!
//! A corrupt image, an unreadable file, a failed copy — each is recorded
//! with its filename and the run moves on. Only setup problems (missing
//! source, uncreatable output root) fail a run outright.

pub mod convert;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod settings;
