//! Per-path dialect overrides.
//!
//! ```toml
//! [dialects.overrides]
//! "kernel/**/*.cpp" = "interface_impl"
//! "toys/**" = "toybox"
//! ```
//!
//! A matching override skips detection entirely. When several patterns
//! match, the lexicographically first pattern wins.

use std::collections::BTreeMap;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use varimap_core::DialectKind;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DialectConfig {
    /// Glob pattern (relative to the analysis root) to forced dialect.
    #[serde(default)]
    pub overrides: BTreeMap<String, DialectKind>,
}

impl DialectConfig {
    /// Compile the override patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for a malformed glob.
    pub fn compile(&self) -> Result<DialectOverrides, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        let mut dialects = Vec::with_capacity(self.overrides.len());
        for (pattern, dialect) in &self.overrides {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
            dialects.push(*dialect);
        }
        let set = builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: self.overrides.keys().cloned().collect::<Vec<_>>().join(", "),
            source,
        })?;
        Ok(DialectOverrides { set, dialects })
    }
}

/// Compiled form of [`DialectConfig::overrides`].
#[derive(Debug, Clone)]
pub struct DialectOverrides {
    set: GlobSet,
    dialects: Vec<DialectKind>,
}

impl Default for DialectOverrides {
    fn default() -> Self {
        Self {
            set: GlobSet::empty(),
            dialects: Vec::new(),
        }
    }
}

impl DialectOverrides {
    /// The forced dialect for `path`, if any pattern matches.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<DialectKind> {
        self.set
            .matches(path)
            .into_iter()
            .min()
            .and_then(|idx| self.dialects.get(idx).copied())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}
