//! Consistency Checker: the single pass after every file is processed.

use std::collections::BTreeMap;

use varimap_core::{Diagnostic, DiagnosticKind, DialectKind, Formula, Location};
use varimap_model::FeatureModel;

use crate::report::FileReport;

/// Cross-references the presence table against a frozen Feature Model.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyChecker<'m> {
    model: &'m FeatureModel,
}

impl<'m> ConsistencyChecker<'m> {
    #[must_use]
    pub const fn new(model: &'m FeatureModel) -> Self {
        Self { model }
    }

    /// The final diagnostics list: `collected` findings from the scan
    /// phases, the model's conflicts and cycles, dependency violations and
    /// undeclared symbols. Sorted and free of duplicates.
    #[must_use]
    pub fn finalize(&self, files: &[FileReport], collected: Vec<Diagnostic>) -> Vec<Diagnostic> {
        let mut diagnostics = collected;
        diagnostics.extend(self.model.conflicts().iter().cloned());
        diagnostics.extend(self.model.cycle_diagnostics());
        diagnostics.extend(self.dependency_violations());
        for file in files {
            diagnostics.extend(self.undeclared(file));
        }
        diagnostics.sort();
        diagnostics.dedup();
        diagnostics
    }

    /// `depends on` and `select` targets that nothing declares.
    #[must_use]
    pub fn dependency_violations(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for feature in self.model.features().filter(|f| !f.implicit) {
            for target in feature.dependency_names() {
                if !self.model.is_declared(target) {
                    out.push(Diagnostic::new(
                        DiagnosticKind::DependencyViolation,
                        feature.origin.clone(),
                        format!("'{}' depends on '{target}', which is not declared", feature.name),
                    ));
                }
            }
            for target in &feature.selects {
                if !self.model.is_declared(target) {
                    out.push(Diagnostic::new(
                        DiagnosticKind::DependencyViolation,
                        feature.origin.clone(),
                        format!("'{}' selects '{target}', which is not declared", feature.name),
                    ));
                }
            }
        }
        out
    }

    /// Global symbols in `file`'s conditions and references that have no
    /// Feature Model entry. One diagnostic per symbol, at its first use.
    ///
    /// Implicit registrations only cover plain-dialect files; a declaring
    /// dialect needs an explicit declaration.
    #[must_use]
    pub fn undeclared(&self, file: &FileReport) -> Vec<Diagnostic> {
        let plain = file.dialect == DialectKind::Plain;
        let known = |name: &str| {
            if plain {
                self.model.contains(name)
            } else {
                self.model.is_declared(name)
            }
        };
        // name -> first line it appears on (`None`: the file condition)
        let mut first_use: BTreeMap<String, Option<u32>> = BTreeMap::new();
        let mut note = |formula: &Formula, line: Option<u32>| {
            for symbol in formula.symbols() {
                if symbol.is_file_local() || known(&symbol.name) {
                    continue;
                }
                first_use
                    .entry(symbol.name.clone())
                    .and_modify(|seen| *seen = (*seen).min(line))
                    .or_insert(line);
            }
        };

        note(&file.file_condition, None);
        for scope in &file.scopes {
            note(&scope.formula, Some(scope.line));
        }
        for reference in &file.references {
            note(&Formula::Var(reference.symbol.clone()), Some(reference.line));
        }

        first_use
            .into_iter()
            .map(|(name, line)| {
                let location = Location {
                    file: file.path.clone(),
                    line,
                };
                Diagnostic {
                    low_confidence: file.fallback,
                    ..Diagnostic::new(
                        DiagnosticKind::UndeclaredSymbol,
                        location,
                        format!("'{name}' is not declared in the feature model"),
                    )
                }
            })
            .collect()
    }
}
