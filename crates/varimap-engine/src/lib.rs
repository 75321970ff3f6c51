//! # varimap-engine
//!
//! Turns source files into a queryable variability model:
//!
//! - [`presence`]: the per-file scope stack computing line presence
//!   conditions
//! - [`satisfiability`]: syntactic unsatisfiability check against the
//!   Feature Model's dependencies
//! - [`checker`]: the final consistency pass (undeclared symbols,
//!   dependency violations, conflicts, cycles)
//! - [`pipeline`]: the two-phase parallel run with cancellation
//! - [`report`]: the serializable result, re-ingest and configuration
//!   evaluation

pub mod checker;
pub mod error;
mod file;
pub mod pipeline;
pub mod presence;
pub mod report;
pub mod satisfiability;

pub use checker::ConsistencyChecker;
pub use error::EngineError;
pub use pipeline::{AnalysisOptions, Analyzer, CancellationToken};
pub use presence::{PresenceEngine, PresenceTable, Region, ScopeId, ScopeKind, ScopeRecord};
pub use report::{
    AnalysisReport, FileEvaluation, FileReport, LineRange, ReferenceRecord, Reingested,
};
pub use satisfiability::{SatisfiabilityCheck, Unsatisfiable};
