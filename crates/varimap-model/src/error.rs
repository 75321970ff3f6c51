//! Feature model error types.

use varimap_core::CoreError;

/// Errors from Feature Model lookups.
///
/// Inconsistencies in the model itself (conflicts, cycles) are diagnostics,
/// not errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// `resolve` was asked for a name no declaration or registration provides.
    #[error("feature not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
