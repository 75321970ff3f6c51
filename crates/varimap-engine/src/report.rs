//! The analysis report: Feature Model, presence table and diagnostics.
//!
//! Every list is kept in a canonical order (features by name, files by
//! path, regions and references by line, diagnostics by location) so that
//! two runs over the same input serialize byte-identically.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use varimap_core::{
    Assignment, Diagnostic, DiagnosticKind, DialectKind, FeatureSymbol, Formula, Symbol,
};
use varimap_model::FeatureModel;

use crate::checker::ConsistencyChecker;
use crate::error::EngineError;
use crate::presence::{Region, ScopeId, ScopeRecord};

/// A symbol use outside any conditional directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceRecord {
    pub line: u32,
    /// Spelling in the source.
    pub token: String,
    pub symbol: Symbol,
    /// Presence condition in effect at the reference.
    pub condition: Formula,
}

/// Per-file slice of the presence table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    pub path: String,
    pub dialect: DialectKind,
    pub confidence: f64,
    /// Detection fell back to the plain dialect.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
    /// Condition under which the build compiles this file at all.
    pub file_condition: Formula,
    #[serde(default)]
    pub scopes: Vec<ScopeRecord>,
    pub regions: Vec<Region>,
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
}

impl FileReport {
    /// The region holding `line`.
    #[must_use]
    pub fn region_at(&self, line: u32) -> Option<&Region> {
        let idx = self.regions.partition_point(|region| region.end_line < line);
        self.regions.get(idx).filter(|region| region.contains(line))
    }

    /// Presence condition of `line`.
    #[must_use]
    pub fn condition_at(&self, line: u32) -> Option<&Formula> {
        self.region_at(line).map(|region| &region.condition)
    }

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeRecord> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    /// Line ranges compiled under `assignment`, adjacent ranges merged.
    ///
    /// Empty when the file condition itself is false.
    #[must_use]
    pub fn compiled_lines(&self, assignment: &Assignment) -> Vec<LineRange> {
        if !self.file_condition.evaluate(assignment) {
            return Vec::new();
        }
        let mut out: Vec<LineRange> = Vec::new();
        for region in self.regions.iter().filter(|r| r.condition.evaluate(assignment)) {
            match out.last_mut() {
                Some(last) if last.end_line + 1 == region.start_line => {
                    last.end_line = region.end_line;
                }
                _ => out.push(LineRange {
                    start_line: region.start_line,
                    end_line: region.end_line,
                }),
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

/// What one file contributes to a build under a concrete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileEvaluation {
    pub path: String,
    pub compiled: bool,
    pub lines: Vec<LineRange>,
}

/// Result of [`AnalysisReport::reingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reingested {
    pub model: FeatureModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub features: Vec<FeatureSymbol>,
    pub files: Vec<FileReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    /// The Feature Model the report was produced against.
    #[must_use]
    pub fn model(&self) -> FeatureModel {
        FeatureModel::from_features(self.features.iter().cloned())
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileReport> {
        self.files.iter().find(|file| file.path == path)
    }

    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Rebuild the Feature Model from `features` and re-run the Consistency
    /// Checker over the presence table.
    #[must_use]
    pub fn reingest(&self) -> Reingested {
        let model = self.model();
        let diagnostics = ConsistencyChecker::new(&model).finalize(&self.files, Vec::new());
        Reingested { model, diagnostics }
    }

    /// Which files and lines a configuration compiles.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> Vec<FileEvaluation> {
        self.files
            .iter()
            .map(|file| FileEvaluation {
                path: file.path.clone(),
                compiled: file.file_condition.evaluate(assignment),
                lines: file.compiled_lines(assignment),
            })
            .collect()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Report`] if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a report written by [`AnalysisReport::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Report`] for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_core::Tristate;

    fn chmod_file() -> FileReport {
        FileReport {
            path: "src/io-file.c".into(),
            dialect: DialectKind::Kbuild,
            confidence: 1.0,
            fallback: false,
            file_condition: Formula::var("INCLUDE_IO_FILE"),
            scopes: Vec::new(),
            regions: vec![
                Region {
                    start_line: 1,
                    end_line: 21,
                    condition: Formula::True,
                    scope: None,
                },
                Region {
                    start_line: 22,
                    end_line: 22,
                    condition: Formula::var("PERFORM_CHMOD"),
                    scope: Some(ScopeId(0)),
                },
                Region {
                    start_line: 23,
                    end_line: 24,
                    condition: Formula::True,
                    scope: None,
                },
            ],
            references: Vec::new(),
        }
    }

    #[test]
    fn condition_lookup_by_line() {
        let file = chmod_file();
        assert_eq!(file.condition_at(22), Some(&Formula::var("PERFORM_CHMOD")));
        assert_eq!(file.condition_at(1), Some(&Formula::True));
        assert_eq!(file.condition_at(24), Some(&Formula::True));
        assert_eq!(file.condition_at(25), None);
        assert_eq!(file.condition_at(0), None);
    }

    #[test]
    fn compiled_lines_follow_assignment() {
        let file = chmod_file();
        let mut assignment = Assignment::new();
        assert!(file.compiled_lines(&assignment).is_empty());

        assignment.set("INCLUDE_IO_FILE", Tristate::Yes);
        assert_eq!(
            file.compiled_lines(&assignment),
            vec![
                LineRange { start_line: 1, end_line: 21 },
                LineRange { start_line: 23, end_line: 24 },
            ]
        );

        assignment.set("PERFORM_CHMOD", Tristate::Yes);
        assert_eq!(
            file.compiled_lines(&assignment),
            vec![LineRange { start_line: 1, end_line: 24 }]
        );
    }
}
