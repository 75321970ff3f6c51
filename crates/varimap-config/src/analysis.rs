//! Analysis policy: aliasing, dialect detection threshold, satisfiability.

use serde::{Deserialize, Serialize};
use varimap_core::AliasPolicy;

/// Default minimum confidence for automatic dialect selection.
const fn default_confidence_threshold() -> f64 {
    0.5
}

const fn default_check_satisfiability() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Whether prefixed spellings unify only through declarations (`strict`)
    /// or unconditionally (`unify`).
    #[serde(default)]
    pub alias_policy: AliasPolicy,

    /// A dialect must score above this to be selected; otherwise the plain
    /// fallback runs. Range `0.0..=1.0`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Whether to run the syntactic unsatisfiability check on every scope.
    #[serde(default = "default_check_satisfiability")]
    pub check_satisfiability: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alias_policy: AliasPolicy::default(),
            confidence_threshold: default_confidence_threshold(),
            check_satisfiability: default_check_satisfiability(),
        }
    }
}
