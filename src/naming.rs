//! Centralized output-path resolution for the `_WebP` naming convention.
//!
//! Existing files and folders are never overwritten: candidate names are
//! probed on disk and a numeric version suffix is appended until a free name
//! is found.
//!
//! ## Conventions
//!
//! - Folder runs: `vacation/` → `vacation_WebP/`, then `vacation_WebP_2/`,
//!   `vacation_WebP_3/`, … A custom output folder bypasses versioning and is
//!   used verbatim.
//! - Single files: `photo.jpg` → `photo.webp` beside the source; if that name
//!   is taken, `photo_WebP_2.webp`, `photo_WebP_3.webp`, …
//! - Grayscale companions insert a `_bw` infix before any version suffix:
//!   `photo_bw.webp`, or `photo_bw_WebP_2.webp` when versioned.

use std::path::{Path, PathBuf};

/// Resolve the output folder for a batch run.
///
/// A custom folder override is used exactly as given (the caller chose it,
/// collisions are theirs to manage). Without one, a `_WebP`-suffixed sibling
/// of the source folder is versioned until free.
pub fn resolve_output_folder(source: &Path, custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(dir) => dir.to_path_buf(),
        None => versioned_output_folder(source),
    }
}

/// First non-existing `<source>_WebP[_N]` sibling of `source`.
pub fn versioned_output_folder(source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let parent = source.parent().unwrap_or_else(|| Path::new(""));

    let first = parent.join(format!("{name}_WebP"));
    if !first.exists() {
        return first;
    }
    versioned(|n| parent.join(format!("{name}_WebP_{n}")))
}

/// First non-existing `<stem>.webp` (or `<stem>_WebP_N.webp`) inside `dir`.
pub fn versioned_output_file(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.webp"));
    if !first.exists() {
        return first;
    }
    versioned(|n| dir.join(format!("{stem}_WebP_{n}.webp")))
}

/// Output path for the grayscale companion of `stem`, probed independently
/// of the color output.
pub fn grayscale_output_file(dir: &Path, stem: &str) -> PathBuf {
    versioned_output_file(dir, &format!("{stem}_bw"))
}

/// Probe version numbers starting at 2 until the candidate does not exist.
fn versioned(candidate: impl Fn(u32) -> PathBuf) -> PathBuf {
    (2u32..)
        .map(candidate)
        .find(|p| !p.exists())
        .expect("version probe space exhausted")
}
