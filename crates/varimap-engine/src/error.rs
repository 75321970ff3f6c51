//! Engine error types for varimap-engine.

/// Errors that stop an analysis run.
///
/// Findings about the analysed code are diagnostics in the report, never
/// errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The run's cancellation token was triggered before all files finished.
    #[error("analysis cancelled")]
    Cancelled,

    /// Source input the dialect layer cannot read.
    #[error("dialect error: {0}")]
    Dialect(#[from] varimap_dialect::DialectError),

    /// Lookup against the Feature Model failed.
    #[error("model error: {0}")]
    Model(#[from] varimap_model::ModelError),

    /// The run configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] varimap_config::ConfigError),

    /// The worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A serialized report could not be read back.
    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),
}
