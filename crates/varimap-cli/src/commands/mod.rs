pub mod analyze;
pub mod closure;
pub mod dispatch;
pub mod eval;
pub mod model;
pub mod schema;

use serde::Serialize;
use varimap_core::Diagnostic;
use varimap_engine::AnalysisReport;

use crate::cli::GlobalFlags;

/// One diagnostic as a flat table row.
#[derive(Debug, Serialize)]
pub struct DiagnosticRow {
    pub location: String,
    pub severity: String,
    pub kind: String,
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticRow {
    fn from(diagnostic: &Diagnostic) -> Self {
        let mut message = diagnostic.message.clone();
        if diagnostic.low_confidence {
            message.push_str(" (low confidence)");
        }
        Self {
            location: diagnostic.location.to_string(),
            severity: diagnostic.severity.to_string(),
            kind: diagnostic.kind.to_string(),
            message,
        }
    }
}

/// `12` for a single line, `12-15` for a range.
#[must_use]
pub fn line_span(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Fail the command under `--deny-fatal` when the model is inconsistent.
/// Output has already been written at this point.
pub fn enforce_deny_fatal(report: &AnalysisReport, flags: &GlobalFlags) -> anyhow::Result<()> {
    if !flags.deny_fatal {
        return Ok(());
    }
    let fatal: Vec<&Diagnostic> = report.diagnostics.iter().filter(|d| d.is_fatal()).collect();
    match fatal.first() {
        None => Ok(()),
        Some(first) => anyhow::bail!(
            "{} fatal diagnostic(s), first: {first}",
            fatal.len()
        ),
    }
}
