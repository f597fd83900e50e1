//! Readability analysis over a directory of persisted content files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use edugen_shared::{EdugenError, Metric, ReadabilityReport, Result};
use tracing::{info, instrument, warn};

/// Scores for one content file.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub filename: String,
    /// Characters of extracted text.
    pub text_length: usize,
    pub report: ReadabilityReport,
}

/// A file that could not be analyzed, and why.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub filename: String,
    pub error: String,
}

/// Aggregate of one metric across all analyzed files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub metric: Metric,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Outcome of [`analyze_directory`].
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub directory: PathBuf,
    pub files: Vec<FileAnalysis>,
    pub errors: Vec<FileFailure>,
    /// One entry per metric; empty when no file was analyzed.
    pub summary: Vec<MetricSummary>,
}

/// Analyze every `*.json` file directly inside `dir`, in filename order.
///
/// Per-file failures (unreadable, invalid JSON, no extractable text) are
/// recorded and the scan continues. A `dir` that is not a directory is an
/// error.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn analyze_directory(dir: &Path) -> Result<BatchReport> {
    if !dir.is_dir() {
        return Err(EdugenError::validation(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| EdugenError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut files = Vec::new();
    let mut errors = Vec::new();

    for path in &paths {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match analyze_file(path) {
            Ok((text_length, report)) => files.push(FileAnalysis {
                filename,
                text_length,
                report,
            }),
            Err(e) => {
                warn!(file = %filename, error = %e, "skipping file");
                errors.push(FileFailure {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        analyzed = files.len(),
        failed = errors.len(),
        "batch analysis complete"
    );

    let summary = summarize(&files);
    Ok(BatchReport {
        directory: dir.to_path_buf(),
        files,
        errors,
        summary,
    })
}

/// Load one file, extract its text and score it.
fn analyze_file(path: &Path) -> Result<(usize, ReadabilityReport)> {
    let raw = std::fs::read_to_string(path).map_err(|e| EdugenError::io(path, e))?;
    let doc: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| EdugenError::parse(format!("invalid JSON: {e}")))?;

    let text = edugen_readability::extract_text(&doc);
    let report = edugen_readability::analyze(&text);
    if !report.is_sufficient() {
        return Err(EdugenError::validation("no extractable text"));
    }

    Ok((text.len(), report))
}

fn summarize(files: &[FileAnalysis]) -> Vec<MetricSummary> {
    if files.is_empty() {
        return Vec::new();
    }

    Metric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = files.iter().map(|f| f.report.score(metric)).collect();
            let count = values.len();
            MetricSummary {
                metric,
                mean: values.iter().sum::<f64>() / count as f64,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                count,
            }
        })
        .collect()
}

impl BatchReport {
    /// Plain-text report, one block per file followed by the aggregate.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- Readability Report: {} ---", self.directory.display());

        if self.files.is_empty() && self.errors.is_empty() {
            let _ = writeln!(out, "\nNo JSON files found.");
            return out;
        }

        for file in &self.files {
            let _ = writeln!(out, "\nFile: {}", file.filename);
            let _ = writeln!(out, "  Text length: {} characters", file.text_length);
            for (metric, value) in file.report.scores() {
                let _ = writeln!(out, "  {}: {value:.2}", metric.label());
            }
        }

        for failure in &self.errors {
            let _ = writeln!(out, "\nFile: {}", failure.filename);
            let _ = writeln!(out, "  Error: {}", failure.error);
        }

        if !self.summary.is_empty() {
            let _ = writeln!(out, "\n--- Summary ({} files) ---", self.files.len());
            for s in &self.summary {
                let _ = writeln!(
                    out,
                    "  {}: mean {:.2}, min {:.2}, max {:.2}",
                    s.metric.label(),
                    s.mean,
                    s.min,
                    s.max
                );
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\n{} file(s) could not be analyzed.", self.errors.len());
        }

        out
    }
}
