//! # varimap-model
//!
//! The Feature Model Store.
//!
//! Declarations arrive concurrently from file scans through
//! [`FeatureStore`], which serializes writes behind a single lock. After the
//! scan barrier, [`FeatureStore::snapshot`] hands out an immutable
//! [`FeatureModel`] that answers `resolve`, dependency-closure and cycle
//! queries without further locking.

pub mod error;
pub mod graph;
pub mod model;
pub mod store;

pub use error::ModelError;
pub use graph::{DependencyCycle, DependencyGraph};
pub use model::FeatureModel;
pub use store::{DeclareOutcome, FeatureStore};
