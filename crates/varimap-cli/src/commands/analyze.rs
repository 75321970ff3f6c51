use serde::Serialize;
use varimap_engine::AnalysisReport;

use crate::cli::root_commands::PathArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::commands::{DiagnosticRow, enforce_deny_fatal, line_span};
use crate::context::AppContext;
use crate::output::output;

/// One region of the presence table as a flat table row.
#[derive(Debug, Serialize)]
struct RegionRow {
    file: String,
    lines: String,
    condition: String,
}

/// Handle `vmap analyze`.
pub fn handle(args: &PathArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.analyze(&args.paths)?;

    if flags.format == OutputFormat::Table {
        output(&region_rows(&report), flags.format)?;
        if !report.diagnostics.is_empty() {
            println!();
            let rows: Vec<DiagnosticRow> = report.diagnostics.iter().map(Into::into).collect();
            output(&rows, flags.format)?;
        }
    } else {
        output(&report, flags.format)?;
    }

    enforce_deny_fatal(&report, flags)
}

fn region_rows(report: &AnalysisReport) -> Vec<RegionRow> {
    report
        .files
        .iter()
        .flat_map(|file| {
            file.regions.iter().map(|region| RegionRow {
                file: file.path.clone(),
                lines: line_span(region.start_line, region.end_line),
                condition: region.condition.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_dialect::SourceFile;
    use varimap_engine::Analyzer;

    #[test]
    fn rows_follow_region_order() {
        let source = "\
//config:config CHMOD
//config:   bool \"chmod\"
#if ENABLE_CHMOD
chmod();
#endif
";
        let report = Analyzer::default()
            .analyze(&[SourceFile::new("src/io.c", source)])
            .unwrap();
        let rows = region_rows(&report);
        let spans: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.lines.as_str(), row.condition.as_str()))
            .collect();
        assert_eq!(spans, vec![("1-3", "true"), ("4", "CHMOD"), ("5", "true")]);
    }
}
