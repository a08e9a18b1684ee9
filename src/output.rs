//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! photo.png
//!     Dimensions: 640x480
//!     Format: png
//!     Mime: image/png
//! ```
//!
//! `info --json` prints the same fields as a single JSON object.
//!
//! ## Operations
//!
//! ```text
//! resize photo.png → small.jpg
//!     Size: 640x480 → 320x240
//!     Quality: 85
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{Dimensions, ImageInfo};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_dimensions(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

fn detail(label: &str, value: impl std::fmt::Display) -> String {
    format!("{}{}: {}", indent(1), label, value)
}

// ============================================================================
// Info
// ============================================================================

/// Format `info` output for one file. Unknown format/mime show as `unknown`.
pub fn format_info(path: &Path, info: &ImageInfo) -> Vec<String> {
    vec![
        path.display().to_string(),
        detail("Dimensions", format_dimensions(info.dimensions)),
        detail("Format", info.format.as_deref().unwrap_or("unknown")),
        detail("Mime", info.mime.as_deref().unwrap_or("unknown")),
    ]
}

pub fn print_info(path: &Path, info: &ImageInfo) {
    for line in format_info(path, info) {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct InfoJson<'a> {
    path: &'a Path,
    width: u32,
    height: u32,
    format: Option<&'a str>,
    mime: Option<&'a str>,
}

/// Format `info --json` output.
pub fn format_info_json(path: &Path, info: &ImageInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&InfoJson {
        path,
        width: info.dimensions.width,
        height: info.dimensions.height,
        format: info.format.as_deref(),
        mime: info.mime.as_deref(),
    })
}

// ============================================================================
// Operations
// ============================================================================

/// What a file-to-file command did.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub command: &'static str,
    pub input: PathBuf,
    pub output: PathBuf,
    pub before: Dimensions,
    pub after: Dimensions,
    /// Extra `(label, value)` lines, e.g. the fitted font size.
    pub details: Vec<(String, String)>,
}

impl OperationReport {
    pub fn detail(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((label.into(), value.to_string()));
        self
    }
}

/// Format a command summary.
///
/// ```text
/// rotate in.png → out.png
///     Size: 300x200 → 200x300
/// ```
///
/// The size line reads `Size: 300x200` when the command kept the dimensions.
pub fn format_operation(report: &OperationReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} → {}",
        report.command,
        report.input.display(),
        report.output.display()
    )];

    let size = if report.before == report.after {
        format_dimensions(report.after)
    } else {
        format!(
            "{} → {}",
            format_dimensions(report.before),
            format_dimensions(report.after)
        )
    };
    lines.push(detail("Size", size));

    for (label, value) in &report.details {
        lines.push(detail(label, value));
    }
    lines
}

pub fn print_operation(report: &OperationReport) {
    for line in format_operation(report) {
        println!("{}", line);
    }
}
