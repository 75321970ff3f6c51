//! Dialect error types for varimap-dialect.

/// Errors from reading or scanning source input.
///
/// Anything a scan can recover from is reported as a diagnostic event
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum DialectError {
    #[error("{path} is not valid UTF-8 (first invalid byte at offset {offset})")]
    NotUtf8 { path: String, offset: usize },
}
