//! Concrete configurations read from Kconfig `.config` files.
//!
//! ```text
//! CONFIG_PERFORM_CHMOD=y
//! CONFIG_FEATURE_LEVEL=3
//! # CONFIG_PERFORM_RENAME is not set
//! ```
//!
//! Keys are stored without the `CONFIG_` prefix so they line up with the
//! canonical feature names the resolver produces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::feature::Tristate;

const CONFIG_PREFIX: &str = "CONFIG_";
const NOT_SET_SUFFIX: &str = " is not set";

/// Values for feature symbols, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    values: BTreeMap<String, Tristate>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text of a `.config` file.
    ///
    /// String and numeric values count as enabled. Lines that are neither an
    /// assignment nor a `# CONFIG_X is not set` marker are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAssignment`] for a `CONFIG_` line without
    /// `=` or with an empty name.
    pub fn parse_dotconfig(text: &str) -> Result<Self, CoreError> {
        let mut assignment = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if let Some(rest) = line.strip_prefix('#') {
                let rest = rest.trim();
                if let Some(name) = rest
                    .strip_prefix(CONFIG_PREFIX)
                    .and_then(|r| r.strip_suffix(NOT_SET_SUFFIX))
                {
                    assignment.set(name.trim(), Tristate::No);
                }
                continue;
            }
            let Some(rest) = line.strip_prefix(CONFIG_PREFIX) else {
                continue;
            };
            let Some((name, value)) = rest.split_once('=') else {
                return Err(CoreError::InvalidAssignment {
                    line: idx + 1,
                    reason: format!("expected CONFIG_NAME=value, found '{line}'"),
                });
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::InvalidAssignment {
                    line: idx + 1,
                    reason: "empty option name".to_string(),
                });
            }
            let value = Tristate::from_literal(value).unwrap_or_else(|| {
                if value.trim().is_empty() {
                    Tristate::No
                } else {
                    Tristate::Yes
                }
            });
            assignment.set(name, value);
        }
        Ok(assignment)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Tristate) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Tristate> {
        self.values.get(name).copied()
    }

    /// `y` or `m`. Unknown names are disabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(Tristate::is_enabled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Tristate)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}
