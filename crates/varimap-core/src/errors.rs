//! Cross-cutting error types for varimap.
//!
//! Analysis findings are never errors: they are [`crate::Diagnostic`] values.
//! The errors here cover input that cannot be interpreted at all. Crate
//! specific errors (`ModelError`, `DialectError`, `EngineError`) live in
//! their own crates and converge in the `vmap` binary through `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any varimap crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `.config` line could not be interpreted.
    #[error("Invalid assignment on line {line}: {reason}")]
    InvalidAssignment { line: usize, reason: String },

    /// A textual value (dialect name, policy, tristate) failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
