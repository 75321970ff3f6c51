use schemars::schema_for;
use varimap_core::{Diagnostic, FeatureSymbol};
use varimap_engine::{AnalysisReport, FileEvaluation};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaKind};
use crate::output::output;

/// Handle `vmap schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema_value(args.kind)?, flags.format)
}

fn schema_value(kind: SchemaKind) -> anyhow::Result<serde_json::Value> {
    let schema = match kind {
        SchemaKind::Report => schema_for!(AnalysisReport),
        SchemaKind::Evaluation => schema_for!(Vec<FileEvaluation>),
        SchemaKind::Feature => schema_for!(FeatureSymbol),
        SchemaKind::Diagnostic => schema_for!(Diagnostic),
    };
    Ok(serde_json::to_value(schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_schema_names_top_level_fields() {
        let schema = schema_value(SchemaKind::Report).unwrap();
        let properties = schema["properties"].as_object().expect("object schema");
        for field in ["features", "files", "diagnostics"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn evaluation_schema_is_an_array() {
        let schema = schema_value(SchemaKind::Evaluation).unwrap();
        assert_eq!(schema["type"], "array");
    }
}
