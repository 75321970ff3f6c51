//! Concurrent, single-writer registry of feature declarations.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::debug;
use varimap_core::{Diagnostic, DiagnosticKind, FeatureSymbol, Location};

use crate::model::FeatureModel;

/// What a single `declare` call observed at the time it ran.
///
/// Conflicts are decided for good only at [`FeatureStore::snapshot`], where
/// the declaration with the smallest origin wins regardless of arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareOutcome {
    /// First declaration of the name.
    Inserted,
    /// Identical to a declaration already held; nothing changed.
    Identical,
    /// Disagrees with a declaration already held.
    Conflict,
}

/// Shared registry written by concurrent file scans.
///
/// Every write takes the same lock, so two scans declaring the same name
/// never race on the conflict check.
#[derive(Debug, Default)]
pub struct FeatureStore {
    declarations: Mutex<BTreeMap<String, Vec<FeatureSymbol>>>,
}

impl FeatureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration. Idempotent for identical declarations.
    pub fn declare(&self, feature: FeatureSymbol) -> DeclareOutcome {
        let mut declarations = self.declarations.lock();
        let entries = declarations.entry(feature.name.clone()).or_default();
        let explicit: Vec<&FeatureSymbol> = entries.iter().filter(|f| !f.implicit).collect();

        let outcome = if explicit.is_empty() {
            DeclareOutcome::Inserted
        } else if explicit.iter().any(|existing| existing.agrees_with(&feature)) {
            DeclareOutcome::Identical
        } else {
            DeclareOutcome::Conflict
        };

        if outcome == DeclareOutcome::Identical {
            // Keep the earliest origin so snapshots do not depend on arrival order.
            if let Some(existing) = entries
                .iter_mut()
                .find(|existing| !existing.implicit && existing.agrees_with(&feature))
                && feature.origin < existing.origin
            {
                *existing = feature;
            }
        } else {
            debug!(name = %feature.name, origin = %feature.origin, ?outcome, "declare");
            entries.push(feature);
        }
        outcome
    }

    /// Auto-register `name` as an implicit boolean (plain dialect).
    ///
    /// Returns `false` when the name already has an explicit declaration, in
    /// which case nothing is registered.
    pub fn declare_implicit(&self, name: &str, origin: Location) -> bool {
        let mut declarations = self.declarations.lock();
        let entries = declarations.entry(name.to_string()).or_default();
        if entries.iter().any(|f| !f.implicit) {
            return false;
        }
        match entries.first_mut() {
            Some(existing) if origin < existing.origin => existing.origin = origin,
            Some(_) => {}
            None => entries.push(FeatureSymbol::implicit(name, origin)),
        }
        true
    }

    /// Whether `name` has an explicit (non-implicit) declaration.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations
            .lock()
            .get(name)
            .is_some_and(|entries| entries.iter().any(|f| !f.implicit))
    }

    /// Freeze the current declarations into an immutable model.
    ///
    /// For every name the declaration with the smallest origin wins; each
    /// later declaration that disagrees with it yields a
    /// `ConflictingDeclaration`. Implicit registrations are dropped when an
    /// explicit declaration exists.
    #[must_use]
    pub fn snapshot(&self) -> FeatureModel {
        let declarations = self.declarations.lock();
        let mut features = BTreeMap::new();
        let mut conflicts = Vec::new();

        for (name, entries) in declarations.iter() {
            let mut explicit: Vec<&FeatureSymbol> = entries.iter().filter(|f| !f.implicit).collect();
            if explicit.is_empty() {
                if let Some(implicit) = entries.first() {
                    features.insert(name.clone(), implicit.clone());
                }
                continue;
            }
            explicit.sort_by(|a, b| a.origin.cmp(&b.origin));
            let winner = explicit[0];
            for other in &explicit[1..] {
                if !other.agrees_with(winner) {
                    conflicts.push(Diagnostic::new(
                        DiagnosticKind::ConflictingDeclaration,
                        other.origin.clone(),
                        format!(
                            "'{name}' declared as {} (default {}{}) conflicts with the declaration at {}",
                            other.kind,
                            other.default,
                            describe_depends(other),
                            winner.origin
                        ),
                    ));
                }
            }
            features.insert(name.clone(), winner.clone());
        }

        conflicts.sort();
        FeatureModel::new(features, conflicts)
    }

    /// Number of distinct names registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.lock().is_empty()
    }
}

fn describe_depends(feature: &FeatureSymbol) -> String {
    feature
        .depends
        .as_ref()
        .map(|depends| format!(", depends on {depends}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_core::{DefaultValue, Formula, Tristate};

    fn chmod(origin: Location) -> FeatureSymbol {
        FeatureSymbol::boolean("PERFORM_CHMOD", origin).with_depends(Formula::var("INCLUDE_IO_FILE"))
    }

    #[test]
    fn identical_redeclaration_is_idempotent() {
        let store = FeatureStore::new();
        assert_eq!(store.declare(chmod(Location::at("a.c", 3))), DeclareOutcome::Inserted);
        assert_eq!(store.declare(chmod(Location::at("b.c", 3))), DeclareOutcome::Identical);

        let model = store.snapshot();
        assert!(model.conflicts().is_empty());
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn conflicting_redeclaration_is_reported_at_later_origin() {
        let store = FeatureStore::new();
        store.declare(chmod(Location::at("b.c", 3)));
        let outcome = store.declare(
            FeatureSymbol::boolean("PERFORM_CHMOD", Location::at("a.c", 9))
                .with_default(DefaultValue::Value(Tristate::Yes)),
        );
        assert_eq!(outcome, DeclareOutcome::Conflict);

        let model = store.snapshot();
        // a.c:9 sorts first, so it wins and b.c:3 is the conflicting one.
        let winner = model.get("PERFORM_CHMOD").unwrap();
        assert_eq!(winner.origin, Location::at("a.c", 9));
        assert_eq!(model.conflicts().len(), 1);
        let conflict = &model.conflicts()[0];
        assert_eq!(conflict.kind, DiagnosticKind::ConflictingDeclaration);
        assert_eq!(conflict.location, Location::at("b.c", 3));
        assert!(conflict.message.contains("a.c:9"));
    }

    #[test]
    fn snapshot_is_independent_of_arrival_order() {
        let first = FeatureStore::new();
        let second = FeatureStore::new();
        let a = chmod(Location::at("a.c", 1));
        let b = FeatureSymbol::boolean("PERFORM_CHMOD", Location::at("b.c", 1));
        first.declare(a.clone());
        first.declare(b.clone());
        second.declare(b);
        second.declare(a);
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn explicit_declaration_supersedes_implicit_registration() {
        let store = FeatureStore::new();
        assert!(store.declare_implicit("TEST", Location::at("main.c", 26)));
        store.declare(FeatureSymbol::boolean("TEST", Location::file("Kconfig")));
        assert!(!store.declare_implicit("TEST", Location::at("other.c", 1)));

        let model = store.snapshot();
        let test = model.get("TEST").unwrap();
        assert!(!test.implicit);
        assert!(model.is_declared("TEST"));
    }

    #[test]
    fn implicit_registration_keeps_earliest_origin() {
        let store = FeatureStore::new();
        store.declare_implicit("DEBUG", Location::at("z.c", 4));
        store.declare_implicit("DEBUG", Location::at("a.c", 8));
        let model = store.snapshot();
        assert_eq!(model.get("DEBUG").unwrap().origin, Location::at("a.c", 8));
        assert!(!model.is_declared("DEBUG"));
    }
}
