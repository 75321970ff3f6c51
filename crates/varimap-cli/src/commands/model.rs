use serde::Serialize;
use varimap_core::{Diagnostic, DiagnosticKind, FeatureSymbol};
use varimap_engine::AnalysisReport;

use crate::cli::root_commands::PathArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::{DiagnosticRow, enforce_deny_fatal};
use crate::context::AppContext;
use crate::output::output;

/// `vmap model` JSON output: the declared features and the findings about
/// the model itself.
#[derive(Debug, Serialize)]
struct ModelResponse<'a> {
    features: &'a [FeatureSymbol],
    diagnostics: Vec<&'a Diagnostic>,
}

#[derive(Debug, Serialize)]
struct FeatureRow {
    name: String,
    kind: String,
    default: String,
    depends: String,
    origin: String,
}

/// Handle `vmap model`.
pub fn handle(args: &PathArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.analyze(&args.paths)?;
    let diagnostics = model_diagnostics(&report);

    if flags.format == OutputFormat::Table {
        let rows: Vec<FeatureRow> = report.features.iter().map(feature_row).collect();
        output(&rows, flags.format)?;
        if !diagnostics.is_empty() {
            println!();
            let rows: Vec<DiagnosticRow> = diagnostics.iter().copied().map(Into::into).collect();
            output(&rows, flags.format)?;
        }
    } else {
        output(
            &ModelResponse {
                features: &report.features,
                diagnostics,
            },
            flags.format,
        )?;
    }

    enforce_deny_fatal(&report, flags)
}

fn model_diagnostics(report: &AnalysisReport) -> Vec<&Diagnostic> {
    report
        .diagnostics
        .iter()
        .filter(|d| {
            matches!(
                d.kind,
                DiagnosticKind::ConflictingDeclaration
                    | DiagnosticKind::CyclicDependency
                    | DiagnosticKind::DependencyViolation
            )
        })
        .collect()
}

fn feature_row(feature: &FeatureSymbol) -> FeatureRow {
    let origin = if feature.implicit {
        format!("{} (implicit)", feature.origin)
    } else {
        feature.origin.to_string()
    };
    FeatureRow {
        name: feature.name.clone(),
        kind: feature.kind.to_string(),
        default: feature.default.to_string(),
        depends: feature
            .depends
            .as_ref()
            .map_or_else(|| String::from("-"), ToString::to_string),
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_core::{Formula, Location};

    #[test]
    fn feature_row_marks_implicit_features() {
        let row = feature_row(&FeatureSymbol::implicit("TEST", Location::at("src/main.c", 26)));
        assert_eq!(row.origin, "src/main.c:26 (implicit)");
        assert_eq!(row.kind, "bool");
        assert_eq!(row.default, "n");
        assert_eq!(row.depends, "-");
    }

    #[test]
    fn feature_row_renders_dependency() {
        let feature = FeatureSymbol::boolean("PERFORM_CHMOD", Location::at("src/io-file.c", 4))
            .with_depends(Formula::var("INCLUDE_IO_FILE"));
        assert_eq!(feature_row(&feature).depends, "INCLUDE_IO_FILE");
    }

    #[test]
    fn only_model_level_diagnostics_are_kept() {
        let report = AnalysisReport {
            features: Vec::new(),
            files: Vec::new(),
            diagnostics: vec![
                Diagnostic::new(
                    DiagnosticKind::UndeclaredSymbol,
                    Location::at("src/a.c", 1),
                    "'X' is not declared in the feature model",
                ),
                Diagnostic::new(
                    DiagnosticKind::DependencyViolation,
                    Location::at("src/a.c", 4),
                    "'WGET' depends on 'NETWORKING', which is not declared",
                ),
            ],
        };
        let kept = model_diagnostics(&report);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, DiagnosticKind::DependencyViolation);
    }
}
