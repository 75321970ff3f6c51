//! # varimap-core
//!
//! Foundational types shared across all varimap crates:
//! - The boolean formula algebra used for presence conditions
//! - Feature symbols (Kconfig-style declarations) and their values
//! - Diagnostics with kinds, severities and locations
//! - Dialect and alias-policy enums
//! - `.config` assignments for evaluating conditions
//! - Cross-cutting error types

pub mod assignment;
pub mod diagnostic;
pub mod enums;
pub mod errors;
pub mod feature;
pub mod formula;
pub mod smtlib;

pub use assignment::Assignment;
pub use diagnostic::{Diagnostic, DiagnosticKind, Location, Severity};
pub use enums::{AliasPolicy, DialectKind};
pub use errors::CoreError;
pub use feature::{DefaultValue, FeatureKind, FeatureSymbol, Tristate};
pub use formula::{Atom, Formula, Symbol};
