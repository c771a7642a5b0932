//! The conversion engine: folder mirroring, per-file pipeline, progress and
//! cancellation.
//!
//! A run moves through fixed phases:
//!
//! ```text
//! Scanning     recursive pre-count of supported images (accurate totals)
//! Analyzing    uniform-size only: derive the batch target box
//! Converting   depth-first mirror of the source tree
//!              ├── image       → geometry → alpha policy → tone → WebP
//!              ├── other file  → byte copy
//!              └── directory   → mirrored directory, recurse
//! ```
//!
//! Per-file failures are recorded and skipped — a batch never aborts because
//! one image is corrupt. Only setup problems (missing source, uncreatable
//! output root) surface as errors from [`Converter::convert_folder`].
//!
//! The cancel flag is polled once per directory entry; cancelling lets the
//! current file finish, leaves completed outputs on disk, and tags the
//! result [`Outcome::Stopped`].

use crate::imaging::codec::{self, EncodeOptions};
use crate::imaging::{geometry, tone};
use crate::naming;
use crate::settings::ConversionSettings;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::{fs, io};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),
    #[error("Not a supported image file: {0}")]
    UnsupportedSource(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// How a run ended. Stopping is not an error: completed outputs stay on
/// disk and the result carries accurate counts either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Stopped,
}

/// Aggregated result of a conversion run.
#[derive(Debug, Serialize)]
pub struct ConversionResult {
    /// The produced file (single-file mode) or output root (folder mode).
    pub output_path: PathBuf,
    /// Supported images found during the pre-scan.
    pub total: usize,
    /// Images successfully converted.
    pub processed: usize,
    /// Per-file error messages, each tagged with the originating filename.
    pub errors: Vec<String>,
    pub outcome: Outcome,
    /// Source bytes of successfully converted images.
    pub bytes_in: u64,
    /// WebP bytes written (grayscale companions included).
    pub bytes_out: u64,
}

/// Pushed to the progress observer after every file and at milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
    pub current: usize,
    pub total: usize,
}

/// Progress observer; invoked synchronously on the worker thread.
pub type ProgressFn<'a> = &'a mut dyn FnMut(&ProgressEvent);

/// Cooperative cancellation handle.
///
/// Cloneable; the clone given to a UI or signal handler shares state with
/// the converter. Cancellation is polled once per traversal step, so a large
/// in-flight encode always completes first.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Mutable state owned by one run: counters, errors and the optional
/// observer. Never shared between runs.
struct RunContext<'a> {
    total: usize,
    processed: usize,
    errors: Vec<String>,
    bytes_in: u64,
    bytes_out: u64,
    uniform: Option<(u32, u32)>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> RunContext<'a> {
    fn new(progress: Option<ProgressFn<'a>>) -> Self {
        Self {
            total: 0,
            processed: 0,
            errors: Vec::new(),
            bytes_in: 0,
            bytes_out: 0,
            uniform: None,
            progress,
        }
    }

    fn emit(&mut self, message: impl Into<String>) {
        if let Some(observer) = self.progress.as_mut() {
            observer(&ProgressEvent {
                message: message.into(),
                current: self.processed,
                total: self.total,
            });
        }
    }

    fn record_error(&mut self, message: String) {
        self.errors.push(message.clone());
        self.emit(message);
    }

    fn into_result(self, output_path: PathBuf, outcome: Outcome) -> ConversionResult {
        ConversionResult {
            output_path,
            total: self.total,
            processed: self.processed,
            errors: self.errors,
            outcome,
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
        }
    }
}

/// One conversion run over a folder tree or a single file.
pub struct Converter {
    settings: ConversionSettings,
    cancel: CancelFlag,
}

impl Converter {
    pub fn new(settings: ConversionSettings) -> Self {
        Self {
            settings,
            cancel: CancelFlag::new(),
        }
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// Handle for requesting cancellation from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Convert every supported image under `source` into a mirrored output
    /// tree, copying everything else verbatim.
    pub fn convert_folder(
        &self,
        source: &Path,
        output: Option<&Path>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ConversionResult, ConvertError> {
        if !source.is_dir() {
            return Err(ConvertError::SourceNotFound(source.to_path_buf()));
        }
        let output_root = naming::resolve_output_folder(source, output);
        let mut ctx = RunContext::new(progress);

        ctx.total = count_images(source);
        self.analyze_if_uniform(source, &mut ctx);
        fs::create_dir_all(&output_root)?;

        let outcome = self.mirror_directory(source, &output_root, &mut ctx)?;
        Ok(ctx.into_result(output_root, outcome))
    }

    /// Convert one image file, writing the result beside it or into a custom
    /// folder.
    pub fn convert_single_file(
        &self,
        source: &Path,
        output: Option<&Path>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<ConversionResult, ConvertError> {
        if !source.exists() {
            return Err(ConvertError::SourceNotFound(source.to_path_buf()));
        }
        if !source.is_file() || !codec::is_supported(source) {
            return Err(ConvertError::UnsupportedSource(source.to_path_buf()));
        }

        let output_dir = match output {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.to_path_buf()
            }
            None => source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };

        let mut ctx = RunContext::new(progress);
        ctx.total = 1;
        self.analyze_if_uniform(source, &mut ctx);

        if self.cancel.is_cancelled() {
            return Ok(ctx.into_result(output_dir, Outcome::Stopped));
        }

        let written = self.convert_image(source, &output_dir, &mut ctx);
        let output_path = written.unwrap_or(output_dir);
        Ok(ctx.into_result(output_path, Outcome::Completed))
    }

    /// Derive the batch target box when uniform sizing is requested.
    fn analyze_if_uniform(&self, source: &Path, ctx: &mut RunContext) {
        let (true, Some(width)) = (self.settings.uniform_size, self.settings.target_width) else {
            return;
        };
        ctx.emit("Analyzing image dimensions...");
        ctx.uniform = Some(geometry::compute_uniform_dimensions(
            source,
            width,
            self.settings.orientation,
        ));
    }

    /// Depth-first mirror of one directory level.
    fn mirror_directory(
        &self,
        source_dir: &Path,
        output_dir: &Path,
        ctx: &mut RunContext,
    ) -> Result<Outcome, ConvertError> {
        // Deterministic order keeps progress and cancellation reproducible.
        let mut entries: Vec<PathBuf> = fs::read_dir(source_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Stopped);
            }
            let name = entry_name(&path);

            if path.is_dir() {
                let mirrored = output_dir.join(&name);
                if let Err(e) = fs::create_dir_all(&mirrored) {
                    ctx.record_error(format!("Error creating {name}: {e}"));
                    continue;
                }
                if self.mirror_directory(&path, &mirrored, ctx)? == Outcome::Stopped {
                    return Ok(Outcome::Stopped);
                }
            } else if codec::is_supported(&path) {
                self.convert_image(&path, output_dir, ctx);
            } else if let Err(e) = fs::copy(&path, output_dir.join(&name)) {
                ctx.record_error(format!("Error copying {name}: {e}"));
            }
        }
        Ok(Outcome::Completed)
    }

    /// Run one image through the pipeline, updating counters in `ctx`.
    ///
    /// Returns the written color output path; failures are recorded in the
    /// context and reported through the progress stream, never propagated.
    fn convert_image(&self, path: &Path, output_dir: &Path, ctx: &mut RunContext) -> Option<PathBuf> {
        let name = entry_name(path);
        match self.process_image(path, output_dir, ctx.uniform) {
            Ok((output_path, bytes_out)) => {
                ctx.processed += 1;
                ctx.bytes_in += fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                ctx.bytes_out += bytes_out;
                ctx.emit(format!("Converted: {name}"));
                Some(output_path)
            }
            Err(e) => {
                ctx.record_error(format!("Error converting {name}: {e}"));
                None
            }
        }
    }

    /// Decode → geometry → alpha policy → tone → encode (+ grayscale
    /// companion). Returns the color output path and total bytes written.
    fn process_image(
        &self,
        path: &Path,
        output_dir: &Path,
        uniform: Option<(u32, u32)>,
    ) -> Result<(PathBuf, u64), codec::CodecError> {
        let mut image = codec::decode(path)?;

        if let Some(target_width) = self.settings.target_width {
            if let Some((w, h)) = uniform {
                image = geometry::crop_to_uniform(&image, w, h);
            } else {
                image = geometry::resize_to_width(image, target_width);
                if self.settings.make_horizontal {
                    image = geometry::crop_vertical_to_landscape(image, target_width);
                }
            }
        }

        image = codec::apply_alpha_policy(image, self.settings.preserve_alpha);

        if let Some(tone_settings) = &self.settings.tone {
            if !tone_settings.is_neutral() {
                image = tone::apply(image, tone_settings);
            }
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let options = EncodeOptions {
            quality: self.settings.quality,
            lossless: self.settings.lossless,
            method: self.settings.method,
        };

        let output_path = naming::versioned_output_file(output_dir, &stem);
        let mut bytes_out = codec::encode_webp(&image, &output_path, options)?;

        if self.settings.grayscale {
            let companion = codec::grayscale_companion(&image);
            let bw_path = naming::grayscale_output_file(output_dir, &stem);
            bytes_out += codec::encode_webp(&companion, &bw_path, options)?;
        }

        Ok((output_path, bytes_out))
    }
}

/// Recursive pre-count of supported images, so progress fractions are
/// accurate before the first file is touched.
fn count_images(source: &Path) -> usize {
    WalkDir::new(source)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && codec::is_supported(e.path()))
        .count()
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
