//! Worker pool sizing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Worker threads for per-file scans. `0` lets rayon decide.
    #[serde(default)]
    pub threads: usize,
}
