use anyhow::Context;
use serde::Serialize;
use varimap_core::Assignment;
use varimap_engine::FileEvaluation;

use crate::cli::root_commands::EvalArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::{enforce_deny_fatal, line_span};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct EvaluationRow {
    file: String,
    compiled: bool,
    lines: String,
}

/// Handle `vmap eval`.
pub fn handle(args: &EvalArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let assignment = Assignment::parse_dotconfig(&text)
        .with_context(|| format!("invalid configuration file {}", args.config.display()))?;

    let report = ctx.analyze(&args.paths)?;
    let evaluations = report.evaluate(&assignment);

    if flags.format == OutputFormat::Table {
        let rows: Vec<EvaluationRow> = evaluations.iter().map(evaluation_row).collect();
        output(&rows, flags.format)?;
    } else {
        output(&evaluations, flags.format)?;
    }

    enforce_deny_fatal(&report, flags)
}

fn evaluation_row(evaluation: &FileEvaluation) -> EvaluationRow {
    let lines = if evaluation.lines.is_empty() {
        String::from("-")
    } else {
        evaluation
            .lines
            .iter()
            .map(|range| line_span(range.start_line, range.end_line))
            .collect::<Vec<_>>()
            .join(", ")
    };
    EvaluationRow {
        file: evaluation.path.clone(),
        compiled: evaluation.compiled,
        lines,
    }
}
