//! The serialized report validates against its generated JSON Schema.

use schemars::schema_for;
use varimap_dialect::SourceFile;
use varimap_engine::{AnalysisReport, Analyzer, FileEvaluation};

const IO_FILE: &str = include_str!("../../../fixtures/busybox-sample/src/io-file.c");
const MAIN_C: &str = include_str!("../../../fixtures/busybox-sample/src/main.c");
const GETS_C: &str = include_str!("../../../fixtures/toybox-sample/toys/example/gets.c");
const MAIN_CPP: &str = include_str!("../../../fixtures/fiasco-sample/src/sample/main.cpp");

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

fn corpus_report() -> AnalysisReport {
    Analyzer::default()
        .analyze(&[
            SourceFile::new("src/io-file.c", IO_FILE),
            SourceFile::new("src/main.c", MAIN_C),
            SourceFile::new("toys/example/gets.c", GETS_C),
            SourceFile::new("src/sample/main.cpp", MAIN_CPP),
        ])
        .unwrap()
}

#[test]
fn report_matches_schema() {
    let report = corpus_report();
    let schema = serde_json::to_value(schema_for!(AnalysisReport)).unwrap();
    let instance = serde_json::to_value(&report).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "report schema violations: {errors:?}");
}

#[test]
fn evaluation_matches_schema() {
    let report = corpus_report();
    let assignment =
        varimap_core::Assignment::parse_dotconfig("CONFIG_PERFORM_CHMOD=y\nCONFIG_INCLUDE_IO_FILE=y\n")
            .unwrap();
    let evaluation = report.evaluate(&assignment);
    let schema = serde_json::to_value(schema_for!(Vec<FileEvaluation>)).unwrap();
    let instance = serde_json::to_value(&evaluation).unwrap();
    let errors = validate_against_schema(&schema, &instance);
    assert!(errors.is_empty(), "evaluation schema violations: {errors:?}");
}
