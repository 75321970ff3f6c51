//! Feature symbols as declared by Kconfig-style fragments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::diagnostic::Location;
use crate::errors::CoreError;
use crate::formula::Formula;

// ---------------------------------------------------------------------------
// FeatureKind
// ---------------------------------------------------------------------------

/// Declared type of a feature symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Boolean,
    Tristate,
}

impl FeatureKind {
    /// Kconfig keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Tristate => "tristate",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tristate
// ---------------------------------------------------------------------------

/// Kconfig value: `n`, `m` or `y`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    No,
    Module,
    Yes,
}

impl Tristate {
    /// Parse a Kconfig literal. Accepts the busybox spellings `true`/`false`.
    #[must_use]
    pub fn from_literal(text: &str) -> Option<Self> {
        match text.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" | "1" => Some(Self::Yes),
            "n" | "no" | "false" | "0" => Some(Self::No),
            "m" | "mod" | "module" => Some(Self::Module),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::No => "n",
            Self::Module => "m",
            Self::Yes => "y",
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::No)
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tristate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_literal(s)
            .ok_or_else(|| CoreError::Validation(format!("not a tristate value: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// DefaultValue
// ---------------------------------------------------------------------------

/// Default of a feature symbol: a literal or an expression over other symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Value(Tristate),
    Expr(Formula),
}

impl Default for DefaultValue {
    fn default() -> Self {
        Self::Value(Tristate::No)
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureSymbol
// ---------------------------------------------------------------------------

/// A declared feature: canonical name, kind, default, dependency and help.
///
/// Created during model ingestion and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureSymbol {
    pub name: String,
    pub kind: FeatureKind,
    #[serde(default)]
    pub default: DefaultValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<Formula>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub origin: Location,
    /// Registered on first use by the plain dialect rather than declared.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub implicit: bool,
}

impl FeatureSymbol {
    /// A boolean feature with default `n` and no dependency.
    #[must_use]
    pub fn boolean(name: impl Into<String>, origin: Location) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Boolean,
            default: DefaultValue::default(),
            depends: None,
            selects: Vec::new(),
            prompt: None,
            help: None,
            origin,
            implicit: false,
        }
    }

    /// The auto-registered form used by the plain dialect.
    #[must_use]
    pub fn implicit(name: impl Into<String>, origin: Location) -> Self {
        Self {
            implicit: true,
            ..Self::boolean(name, origin)
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn with_depends(mut self, depends: Formula) -> Self {
        self.depends = Some(depends);
        self
    }

    /// Whether two declarations of the same name describe the same feature.
    ///
    /// Help text, prompt and origin are presentation details and are ignored.
    #[must_use]
    pub fn agrees_with(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.default == other.default
            && self.depends == other.depends
    }

    /// Global names this feature's `depends on` expression mentions.
    #[must_use]
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .depends
            .iter()
            .flat_map(Formula::symbols)
            .filter(|symbol| !symbol.is_file_local())
            .map(|symbol| symbol.name.as_str())
            .collect();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("y", Some(Tristate::Yes))]
    #[case("true", Some(Tristate::Yes))]
    #[case("n", Some(Tristate::No))]
    #[case("false", Some(Tristate::No))]
    #[case("m", Some(Tristate::Module))]
    #[case("\"y\"", Some(Tristate::Yes))]
    #[case("FOO && BAR", None)]
    fn tristate_literals(#[case] text: &str, #[case] expected: Option<Tristate>) {
        assert_eq!(Tristate::from_literal(text), expected);
    }

    #[test]
    fn agreement_ignores_help_and_origin() {
        let a = FeatureSymbol::boolean("A", Location::file("a.c"));
        let mut b = FeatureSymbol::boolean("A", Location::at("b.c", 7));
        b.help = Some("different words".into());
        assert!(a.agrees_with(&b));
    }

    #[test]
    fn agreement_checks_dependency() {
        let a = FeatureSymbol::boolean("A", Location::file("a.c")).with_depends(Formula::var("B"));
        let b = FeatureSymbol::boolean("A", Location::file("b.c"));
        assert!(!a.agrees_with(&b));
    }

    #[test]
    fn dependency_names_come_from_depends_expression() {
        let a = FeatureSymbol::boolean("A", Location::file("a.c")).with_depends(Formula::and([
            Formula::var("B"),
            Formula::not(Formula::var("C")),
        ]));
        assert_eq!(a.dependency_names(), vec!["B", "C"]);
    }
}
