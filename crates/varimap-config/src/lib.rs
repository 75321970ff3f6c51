//! # varimap-config
//!
//! Layered configuration loading for varimap using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`VARIMAP_*` prefix, `__` as separator)
//! 2. Project-level `.varimap/config.toml` under the analysis root
//! 3. User-level `~/.config/varimap/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `VARIMAP_ANALYSIS__ALIAS_POLICY` -> `analysis.alias_policy`,
//! `VARIMAP_ENGINE__THREADS` -> `engine.threads`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use varimap_config::VarimapConfig;
//!
//! let config = VarimapConfig::load_with_dotenv().expect("config");
//! println!("policy: {}", config.analysis.alias_policy);
//! ```

mod analysis;
mod dialects;
mod engine;
mod error;

pub use analysis::AnalysisConfig;
pub use dialects::{DialectConfig, DialectOverrides};
pub use engine::EngineConfig;
pub use error::ConfigError;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An explicit spelling-to-feature alias, applied before any prefix rule.
///
/// ```toml
/// [[aliases]]
/// token = "HAVE_CHMOD"
/// symbol = "PERFORM_CHMOD"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasEntry {
    pub token: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VarimapConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
    #[serde(default)]
    pub dialects: DialectConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl VarimapConfig {
    /// Load configuration from all sources, with the current directory as the
    /// project root.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be parsed or a value is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `.varimap/config.toml` looked up under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be parsed or a value is
    /// out of range.
    pub fn load_from(root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_for(root).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain for the current directory.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    /// Build the figment provider chain with `root` as the project directory.
    ///
    /// Public so tests can inspect the figment directly or add providers on
    /// top.
    #[must_use]
    pub fn figment_for(root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = root.join(".varimap").join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("VARIMAP_").split("__"))
    }

    /// Check value ranges and alias consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a threshold outside
    /// `0.0..=1.0`, an empty alias, or one token aliased to two symbols.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.analysis.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                field: "analysis.confidence_threshold".into(),
                reason: format!("{threshold} is outside 0.0..=1.0"),
            });
        }

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for alias in &self.aliases {
            if alias.token.trim().is_empty() || alias.symbol.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "aliases".into(),
                    reason: "token and symbol must both be non-empty".into(),
                });
            }
            if let Some(previous) = seen.insert(&alias.token, &alias.symbol)
                && previous != alias.symbol
            {
                return Err(ConfigError::InvalidValue {
                    field: "aliases".into(),
                    reason: format!(
                        "'{}' is aliased to both '{previous}' and '{}'",
                        alias.token, alias.symbol
                    ),
                });
            }
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("varimap").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varimap_core::AliasPolicy;

    #[test]
    fn default_config_is_valid() {
        let config = VarimapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.alias_policy, AliasPolicy::Strict);
        assert!(config.aliases.is_empty());
        assert_eq!(config.engine.threads, 0);
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let mut config = VarimapConfig::default();
        config.analysis.confidence_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "analysis.confidence_threshold"));
    }

    #[test]
    fn conflicting_aliases_are_rejected() {
        let config = VarimapConfig {
            aliases: vec![
                AliasEntry {
                    token: "HAVE_X".into(),
                    symbol: "X".into(),
                },
                AliasEntry {
                    token: "HAVE_X".into(),
                    symbol: "Y".into(),
                },
            ],
            ..VarimapConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
