//! CLI output formatting for conversion runs.
//!
//! Each surface has a `format_*` function (pure, returns strings — no I/O,
//! no side effects) and a `print_*` wrapper that writes to stdout, so the
//! exact text the user sees is unit-testable.
//!
//! ```text
//! [1/3] Converted: red.jpg
//! [2/3] Converted: green.png
//! [2/3] Error converting broken.jpg: Failed to decode ...
//!
//! Converted 2/3 images to photos_WebP
//! Saved 1.2 MB (3.4 MB -> 2.2 MB)
//! 1 error:
//!   Error converting broken.jpg: Failed to decode ...
//! ```

use crate::convert::{ConversionResult, Outcome, ProgressEvent};
use std::path::Path;

/// One progress line: `[current/total] message`.
pub fn format_progress(event: &ProgressEvent) -> String {
    format!("[{}/{}] {}", event.current, event.total, event.message)
}

/// Multi-line end-of-run summary.
pub fn format_summary(result: &ConversionResult) -> Vec<String> {
    let mut lines = Vec::new();

    match result.outcome {
        Outcome::Completed => lines.push(format!(
            "Converted {}/{} images to {}",
            result.processed,
            result.total,
            result.output_path.display()
        )),
        Outcome::Stopped => lines.push(format!(
            "Stopped after {}/{} images; partial output in {}",
            result.processed,
            result.total,
            result.output_path.display()
        )),
    }

    if result.bytes_in > result.bytes_out {
        lines.push(format!(
            "Saved {} ({} -> {})",
            format_bytes(result.bytes_in - result.bytes_out),
            format_bytes(result.bytes_in),
            format_bytes(result.bytes_out),
        ));
    } else if result.bytes_out > 0 {
        lines.push(format!("Wrote {}", format_bytes(result.bytes_out)));
    }

    if !result.errors.is_empty() {
        let label = if result.errors.len() == 1 { "error" } else { "errors" };
        lines.push(format!("{} {label}:", result.errors.len()));
        for error in &result.errors {
            lines.push(format!("  {error}"));
        }
    }

    lines
}

pub fn print_summary(result: &ConversionResult) {
    for line in format_summary(result) {
        println!("{line}");
    }
}

/// Write the run result as pretty-printed JSON.
pub fn write_report(result: &ConversionResult, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(result).expect("result serializes");
    std::fs::write(path, json)
}

/// Human-readable byte size (B / KB / MB / GB).
fn format_bytes(n: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match n {
        _ if n >= GB => format!("{:.2} GB", n as f64 / GB as f64),
        _ if n >= MB => format!("{:.1} MB", n as f64 / MB as f64),
        _ if n >= KB => format!("{:.1} KB", n as f64 / KB as f64),
        _ => format!("{n} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(outcome: Outcome, errors: Vec<String>) -> ConversionResult {
        ConversionResult {
            output_path: PathBuf::from("photos_WebP"),
            total: 3,
            processed: 2,
            errors,
            outcome,
            bytes_in: 3 * 1024 * 1024,
            bytes_out: 1024 * 1024,
        }
    }

    #[test]
    fn progress_line_format() {
        let line = format_progress(&ProgressEvent {
            message: "Converted: red.jpg".to_string(),
            current: 1,
            total: 3,
        });
        assert_eq!(line, "[1/3] Converted: red.jpg");
    }

    #[test]
    fn completed_summary_lists_counts_and_savings() {
        let lines = format_summary(&result(Outcome::Completed, vec![]));
        assert_eq!(lines[0], "Converted 2/3 images to photos_WebP");
        assert_eq!(lines[1], "Saved 2.0 MB (3.0 MB -> 1.0 MB)");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn stopped_summary_reports_partial_output() {
        let lines = format_summary(&result(Outcome::Stopped, vec![]));
        assert!(lines[0].starts_with("Stopped after 2/3 images"));
    }

    #[test]
    fn errors_are_listed_indented() {
        let lines = format_summary(&result(
            Outcome::Completed,
            vec!["Error converting broken.jpg: bad data".to_string()],
        ));
        assert_eq!(lines[2], "1 error:");
        assert_eq!(lines[3], "  Error converting broken.jpg: bad data");
    }

    #[test]
    fn byte_sizes_pick_sensible_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn report_is_valid_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        write_report(&result(Outcome::Completed, vec![]), &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["total"], 3);
        assert_eq!(parsed["processed"], 2);
        assert_eq!(parsed["outcome"], "completed");
    }
}
