//! JSON output helpers.
//!
//! A run or status query prints the whole `ConvergenceReport` as one object.
//! Failures outside the pipeline (argument or environment problems) print the
//! error object below instead.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::ConvergenceReport;

/// Envelope around a report: `converged` saves consumers re-deriving it.
#[derive(Serialize)]
struct ReportEnvelope<'a> {
    converged: bool,
    #[serde(flatten)]
    report: &'a ConvergenceReport,
}

/// Pretty-printed JSON for a report.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_report(report: &ConvergenceReport) -> Result<String> {
    serde_json::to_string_pretty(&ReportEnvelope {
        converged: report.converged(),
        report,
    })
    .context("JSON serialization failed")
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
