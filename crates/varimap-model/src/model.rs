//! Read-only snapshot of the Feature Model.

use std::collections::{BTreeMap, BTreeSet};

use varimap_core::{Diagnostic, DiagnosticKind, FeatureSymbol, Location};

use crate::error::ModelError;
use crate::graph::{DependencyCycle, DependencyGraph};
use crate::store::FeatureStore;

/// Immutable Feature Model handed to readers after the scan barrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureModel {
    features: BTreeMap<String, FeatureSymbol>,
    conflicts: Vec<Diagnostic>,
}

impl FeatureModel {
    pub(crate) const fn new(
        features: BTreeMap<String, FeatureSymbol>,
        conflicts: Vec<Diagnostic>,
    ) -> Self {
        Self {
            features,
            conflicts,
        }
    }

    /// Rebuild a model from serialized features, as if each had been
    /// declared by a scan.
    #[must_use]
    pub fn from_features(features: impl IntoIterator<Item = FeatureSymbol>) -> Self {
        let store = FeatureStore::new();
        for feature in features {
            if feature.implicit {
                store.declare_implicit(&feature.name, feature.origin);
            } else {
                store.declare(feature);
            }
        }
        store.snapshot()
    }

    /// Look up a feature by canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFound`] when nothing declares `name`.
    pub fn resolve(&self, name: &str) -> Result<&FeatureSymbol, ModelError> {
        self.features
            .get(name)
            .ok_or_else(|| ModelError::NotFound(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureSymbol> {
        self.features.get(name)
    }

    /// Declared or implicitly registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Declared by a Kconfig fragment, not merely auto-registered.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.features.get(name).is_some_and(|f| !f.implicit)
    }

    /// Features in name order.
    pub fn features(&self) -> impl Iterator<Item = &FeatureSymbol> {
        self.features.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `ConflictingDeclaration` diagnostics found while freezing the store.
    #[must_use]
    pub fn conflicts(&self) -> &[Diagnostic] {
        &self.conflicts
    }

    #[must_use]
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.features)
    }

    /// Every symbol `name` transitively depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFound`] when `name` is not in the model.
    pub fn dependency_closure(&self, name: &str) -> Result<BTreeSet<String>, ModelError> {
        self.resolve(name)?;
        Ok(self.dependency_graph().closure(name))
    }

    #[must_use]
    pub fn cycles(&self) -> Vec<DependencyCycle> {
        self.dependency_graph().cycles()
    }

    /// Names that lie on some dependency cycle.
    #[must_use]
    pub fn cyclic_symbols(&self) -> BTreeSet<String> {
        self.dependency_graph().cyclic_members()
    }

    /// One fatal `CyclicDependency` per cycle, located at the declaration of
    /// the cycle's first member.
    #[must_use]
    pub fn cycle_diagnostics(&self) -> Vec<Diagnostic> {
        self.cycles()
            .into_iter()
            .map(|cycle| {
                let location = cycle
                    .path
                    .first()
                    .and_then(|name| self.features.get(name))
                    .map_or_else(|| Location::file("<model>"), |f| f.origin.clone());
                Diagnostic::new(
                    DiagnosticKind::CyclicDependency,
                    location,
                    format!("dependency cycle: {cycle}"),
                )
            })
            .collect()
    }

    /// Literals implied by `name` being enabled: the conjunctive parts of its
    /// `depends on`, followed transitively through positive literals.
    ///
    /// The result may hold both polarities of one symbol when the model
    /// itself is contradictory.
    #[must_use]
    pub fn required_literals(&self, name: &str) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::from([name.to_string()]);
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            let Some(depends) = self.features.get(&current).and_then(|f| f.depends.as_ref())
            else {
                continue;
            };
            for (symbol, positive) in depends.required_literals() {
                if symbol.is_file_local() {
                    continue;
                }
                out.push((symbol.name.clone(), positive));
                if positive && seen.insert(symbol.name.clone()) {
                    pending.push(symbol.name.clone());
                }
            }
        }
        out.sort();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_core::{DefaultValue, Formula, Tristate};

    fn io_file_model() -> FeatureModel {
        FeatureModel::from_features([
            FeatureSymbol::boolean("INCLUDE_IO_FILE", Location::at("src/io-file.c", 9))
                .with_default(DefaultValue::Value(Tristate::Yes)),
            FeatureSymbol::boolean("PERFORM_CHMOD", Location::at("src/io-file.c", 14))
                .with_depends(Formula::var("INCLUDE_IO_FILE")),
        ])
    }

    #[test]
    fn resolve_and_not_found() {
        let model = io_file_model();
        assert_eq!(model.resolve("PERFORM_CHMOD").unwrap().name, "PERFORM_CHMOD");
        assert!(matches!(
            model.resolve("PERFORM_RENAME"),
            Err(ModelError::NotFound(name)) if name == "PERFORM_RENAME"
        ));
    }

    #[test]
    fn chmod_closure_is_include_io_file() {
        let model = io_file_model();
        let closure = model.dependency_closure("PERFORM_CHMOD").unwrap();
        assert_eq!(closure, BTreeSet::from(["INCLUDE_IO_FILE".to_string()]));
        assert!(model.cycle_diagnostics().is_empty());
    }

    #[test]
    fn required_literals_follow_positive_dependencies() {
        let model = FeatureModel::from_features([
            FeatureSymbol::boolean("A", Location::file("K")).with_depends(Formula::and([
                Formula::var("B"),
                Formula::not(Formula::var("C")),
            ])),
            FeatureSymbol::boolean("B", Location::file("K")).with_depends(Formula::var("C")),
        ]);
        assert_eq!(
            model.required_literals("A"),
            vec![
                ("B".to_string(), true),
                ("C".to_string(), false),
                ("C".to_string(), true),
            ]
        );
    }

    #[test]
    fn cycle_diagnostic_is_fatal_and_names_path() {
        let model = FeatureModel::from_features([
            FeatureSymbol::boolean("USE_GETS", Location::at("toys/gets.c", 7))
                .with_depends(Formula::var("GETS")),
            FeatureSymbol::boolean("GETS", Location::at("toys/gets.c", 2))
                .with_depends(Formula::var("USE_GETS")),
        ]);
        let diagnostics = model.cycle_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_fatal());
        assert_eq!(diagnostics[0].location, Location::at("toys/gets.c", 2));
        assert_eq!(diagnostics[0].message, "dependency cycle: GETS -> USE_GETS -> GETS");
        assert_eq!(
            model.cyclic_symbols(),
            BTreeSet::from(["GETS".to_string(), "USE_GETS".to_string()])
        );
    }

    #[test]
    fn cycles_sharing_a_node_each_get_a_diagnostic() {
        let model = FeatureModel::from_features([
            FeatureSymbol::boolean("A", Location::at("Kconfig", 1)).with_depends(Formula::and([
                Formula::var("B"),
                Formula::var("C"),
            ])),
            FeatureSymbol::boolean("B", Location::at("Kconfig", 5)).with_depends(Formula::var("D")),
            FeatureSymbol::boolean("C", Location::at("Kconfig", 9)).with_depends(Formula::var("D")),
            FeatureSymbol::boolean("D", Location::at("Kconfig", 13)).with_depends(Formula::var("A")),
        ]);
        assert!(model.cyclic_symbols().contains("C"));
        let messages: Vec<String> = model
            .cycle_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "dependency cycle: A -> B -> D -> A",
                "dependency cycle: A -> C -> D -> A",
            ]
        );
    }
}
