//! Syntactic unsatisfiability check for scope conditions.
//!
//! A condition is reduced to the literals every satisfying assignment must
//! contain. Positive literals are expanded through the conjunctive parts of
//! their `depends on`, transitively. The condition is unsatisfiable when
//! that set holds a symbol in both polarities, when it requires a symbol
//! that lies on a dependency cycle, or when it is the constant `false`.

use std::collections::{BTreeMap, BTreeSet};

use varimap_core::Formula;
use varimap_model::FeatureModel;

/// Why a condition can never hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsatisfiable {
    AlwaysFalse,
    /// `symbol` is required both enabled and disabled.
    Contradiction { symbol: String },
    /// `symbol` is required but sits on a dependency cycle.
    Cyclic { symbol: String },
}

impl Unsatisfiable {
    /// Diagnostic message for a scope whose cumulative condition is `condition`.
    #[must_use]
    pub fn describe(&self, condition: &Formula) -> String {
        match self {
            Self::AlwaysFalse => "scope condition is always false".to_string(),
            Self::Contradiction { symbol } => {
                format!("scope condition {condition} requires both {symbol} and !{symbol}")
            }
            Self::Cyclic { symbol } => format!(
                "scope condition {condition} requires {symbol}, which lies on a dependency cycle"
            ),
        }
    }
}

/// Checks conditions against one frozen Feature Model.
#[derive(Debug, Clone)]
pub struct SatisfiabilityCheck<'m> {
    model: &'m FeatureModel,
    cyclic: BTreeSet<String>,
}

impl<'m> SatisfiabilityCheck<'m> {
    #[must_use]
    pub fn new(model: &'m FeatureModel) -> Self {
        Self {
            model,
            cyclic: model.cyclic_symbols(),
        }
    }

    /// `Some(reason)` when `condition` is provably unsatisfiable.
    #[must_use]
    pub fn check(&self, condition: &Formula) -> Option<Unsatisfiable> {
        if condition.is_false() {
            return Some(Unsatisfiable::AlwaysFalse);
        }

        // name -> (required enabled, required disabled)
        let mut required: BTreeMap<String, (bool, bool)> = BTreeMap::new();
        let mut require = |name: String, positive: bool| {
            let entry = required.entry(name).or_default();
            if positive {
                entry.0 = true;
            } else {
                entry.1 = true;
            }
        };

        for (symbol, positive) in condition.required_literals() {
            if symbol.is_file_local() {
                require(symbol.to_string(), positive);
                continue;
            }
            if positive {
                for (name, implied) in self.model.required_literals(&symbol.name) {
                    require(name, implied);
                }
            }
            require(symbol.name.clone(), positive);
        }

        if let Some(symbol) = required
            .iter()
            .find_map(|(name, (on, off))| (*on && *off).then(|| name.clone()))
        {
            return Some(Unsatisfiable::Contradiction { symbol });
        }
        required
            .iter()
            .find_map(|(name, (on, _))| (*on && self.cyclic.contains(name)).then(|| name.clone()))
            .map(|symbol| Unsatisfiable::Cyclic { symbol })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use varimap_core::{FeatureSymbol, Location};

    fn chain_model() -> FeatureModel {
        FeatureModel::from_features([
            FeatureSymbol::boolean("A", Location::at("k.c", 1)).with_depends(Formula::var("B")),
            FeatureSymbol::boolean("B", Location::at("k.c", 2)).with_depends(Formula::var("C")),
            FeatureSymbol::boolean("C", Location::at("k.c", 3)),
        ])
    }

    #[test]
    fn plain_literal_is_satisfiable() {
        let model = chain_model();
        let check = SatisfiabilityCheck::new(&model);
        assert_eq!(check.check(&Formula::var("A")), None);
        assert_eq!(check.check(&Formula::True), None);
    }

    #[test]
    fn constant_false_is_unsatisfiable() {
        let model = FeatureModel::default();
        let check = SatisfiabilityCheck::new(&model);
        assert_eq!(check.check(&Formula::False), Some(Unsatisfiable::AlwaysFalse));
    }

    #[test]
    fn transitive_dependency_contradiction() {
        let model = chain_model();
        let check = SatisfiabilityCheck::new(&model);
        let condition = Formula::and([Formula::var("A"), Formula::not(Formula::var("C"))]);
        assert_eq!(
            check.check(&condition),
            Some(Unsatisfiable::Contradiction { symbol: "C".into() })
        );
    }

    #[test]
    fn disjunctions_are_not_expanded() {
        let model = chain_model();
        let check = SatisfiabilityCheck::new(&model);
        let condition = Formula::and([
            Formula::or([Formula::var("A"), Formula::var("X")]),
            Formula::not(Formula::var("C")),
        ]);
        assert_eq!(check.check(&condition), None);
    }

    #[test]
    fn requiring_a_cyclic_symbol_is_unsatisfiable() {
        let model = FeatureModel::from_features([
            FeatureSymbol::boolean("P", Location::at("t.c", 1)).with_depends(Formula::var("Q")),
            FeatureSymbol::boolean("Q", Location::at("t.c", 5)).with_depends(Formula::var("P")),
        ]);
        let check = SatisfiabilityCheck::new(&model);
        assert_eq!(
            check.check(&Formula::var("P")),
            Some(Unsatisfiable::Cyclic { symbol: "P".into() })
        );
        assert_eq!(check.check(&Formula::not(Formula::var("P"))), None);
    }

    #[test]
    fn file_local_symbols_do_not_touch_the_model() {
        let model = chain_model();
        let check = SatisfiabilityCheck::new(&model);
        let local = Formula::Var(varimap_core::Symbol::file_local("C", "m.c"));
        let condition = Formula::and([Formula::var("A"), Formula::not(local)]);
        assert_eq!(check.check(&condition), None);
    }
}
