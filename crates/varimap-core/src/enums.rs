//! Dialect and alias-policy enums for varimap.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and parse from the same spelling, so config files, CLI flags and JSON
//! reports agree on one vocabulary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// DialectKind
// ---------------------------------------------------------------------------

/// Convention a source file uses to declare features and gate code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// busybox-style `//config:` blocks and `//kbuild:` rules.
    Kbuild,
    /// toybox-style header comment with `USE_X(...)` wrappers.
    Toybox,
    /// Fiasco-style `INTERFACE:` / `IMPLEMENTATION[x]:` sections.
    InterfaceImpl,
    /// Fallback: bare macros, symbols registered on first use.
    Plain,
}

impl DialectKind {
    /// Every dialect, in detection tie-break order.
    pub const ALL: [Self; 4] = [Self::InterfaceImpl, Self::Toybox, Self::Kbuild, Self::Plain];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kbuild => "kbuild",
            Self::Toybox => "toybox",
            Self::InterfaceImpl => "interface_impl",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kbuild" | "busybox" => Ok(Self::Kbuild),
            "toybox" => Ok(Self::Toybox),
            "interface_impl" | "fiasco" => Ok(Self::InterfaceImpl),
            "plain" => Ok(Self::Plain),
            other => Err(CoreError::Validation(format!("unknown dialect '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// AliasPolicy
// ---------------------------------------------------------------------------

/// How prefixed macro spellings map onto canonical feature symbols.
///
/// ```text
/// strict: CONFIG_X -> X only when X is declared; bare X stays distinct
/// unify:  CONFIG_X, CFG_X, ENABLE_X, X -> X unconditionally
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    #[default]
    Strict,
    Unify,
}

impl AliasPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Unify => "unify",
        }
    }
}

impl fmt::Display for AliasPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AliasPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "unify" | "unify_across_dialects" => Ok(Self::Unify),
            other => Err(CoreError::Validation(format!("unknown alias policy '{other}'"))),
        }
    }
}
