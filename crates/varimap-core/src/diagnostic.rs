//! Diagnostics: accumulated findings, never control flow.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How serious a diagnostic is. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    /// The model itself is inconsistent (dependency cycle).
    Fatal,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DiagnosticKind
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UndeclaredSymbol,
    ConflictingDeclaration,
    UnsatisfiableScope,
    DependencyViolation,
    AliasAmbiguity,
    CyclicDependency,
    UnterminatedScope,
    /// No dialect reached the confidence threshold; the plain fallback ran.
    LowConfidence,
    /// `#elif` / `#else` / `#endif` without an open `#if`.
    UnbalancedDirective,
    /// Condition text that could not be parsed.
    MalformedCondition,
}

impl DiagnosticKind {
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn severity(self) -> Severity {
        match self {
            Self::CyclicDependency => Severity::Fatal,
            Self::ConflictingDeclaration | Self::DependencyViolation | Self::UnsatisfiableScope => {
                Severity::Error
            }
            Self::UndeclaredSymbol
            | Self::AliasAmbiguity
            | Self::UnterminatedScope
            | Self::UnbalancedDirective
            | Self::MalformedCondition => Severity::Warning,
            Self::LowConfidence => Severity::Info,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UndeclaredSymbol => "undeclared_symbol",
            Self::ConflictingDeclaration => "conflicting_declaration",
            Self::UnsatisfiableScope => "unsatisfiable_scope",
            Self::DependencyViolation => "dependency_violation",
            Self::AliasAmbiguity => "alias_ambiguity",
            Self::CyclicDependency => "cyclic_dependency",
            Self::UnterminatedScope => "unterminated_scope",
            Self::LowConfidence => "low_confidence",
            Self::UnbalancedDirective => "unbalanced_directive",
            Self::MalformedCondition => "malformed_condition",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A file, and optionally a 1-based line within it.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Location {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Location {
    #[must_use]
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn at(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.file),
            None => f.write_str(&self.file),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// One finding. Field order is the sort order: location, kind, message.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Diagnostic {
    pub location: Location,
    pub kind: DiagnosticKind,
    pub message: String,
    pub severity: Severity,
    /// Produced while analysing a file the plain fallback dialect handled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub low_confidence: bool,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
            severity: kind.severity(),
            low_confidence: false,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location, self.severity, self.kind, self.message
        )
    }
}
