//! Proxy configuration.
//!
//! [`ProxyConfig::default()`] matches the behaviour of a bare
//! [`SortingProxyModel::new`](crate::SortingProxyModel::new): sort on
//! [`Role::Sort`], unspecified tie order, no initial sort.
//!
//! # Loading
//!
//! With the `config` feature the config can be read from TOML or JSON:
//!
//! ```toml
//! sort_role = "sort"
//! tie_break = "source_order"
//!
//! [initial_sort]
//! column = 0
//! order = "descending"
//! ```
//!
//! # Environment
//!
//! [`ProxyConfig::from_env`] reads `SORTVIEW_TIE_BREAK` (`stable`,
//! `source`, `source_order`, `1`) and `SORTVIEW_SORT_ROLE` (`display`,
//! `sort`). Unrecognized values are ignored with a warning.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use sortview_model::Role;

/// Sort direction.
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// How rows with equal sort keys are ordered relative to each other.
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TieBreak {
    /// Any order; uses an unstable sort.
    #[default]
    Unspecified,
    /// Equal keys keep their source order, in both directions.
    SourceOrder,
}

/// Sort applied when the proxy is constructed.
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialSort {
    pub column: usize,
    #[cfg_attr(feature = "config", serde(default))]
    pub order: SortOrder,
}

/// Tunables for a [`SortingProxyModel`](crate::SortingProxyModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ProxyConfig {
    /// Role whose values are compared.
    pub sort_role: Role,
    /// Ordering among equal keys.
    pub tie_break: TieBreak,
    /// Optional sort applied at construction.
    pub initial_sort: Option<InitialSort>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            sort_role: Role::Sort,
            tie_break: TieBreak::Unspecified,
            initial_sort: None,
        }
    }
}

impl ProxyConfig {
    /// Defaults overridden by `SORTVIEW_TIE_BREAK` / `SORTVIEW_SORT_ROLE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup("SORTVIEW_TIE_BREAK") {
            match value.to_ascii_lowercase().as_str() {
                "1" | "stable" | "source" | "source_order" => {
                    config.tie_break = TieBreak::SourceOrder;
                }
                "0" | "unstable" | "unspecified" => config.tie_break = TieBreak::Unspecified,
                _ => tracing::warn!(value = %value, "ignoring unrecognized SORTVIEW_TIE_BREAK"),
            }
        }
        if let Some(value) = lookup("SORTVIEW_SORT_ROLE") {
            match value.to_ascii_lowercase().as_str() {
                "display" => config.sort_role = Role::Display,
                "sort" => config.sort_role = Role::Sort,
                _ => tracing::warn!(value = %value, "ignoring unrecognized SORTVIEW_SORT_ROLE"),
            }
        }
        config
    }

    /// Set the sort role.
    #[must_use]
    pub fn with_sort_role(mut self, role: Role) -> Self {
        self.sort_role = role;
        self
    }

    /// Set the tie-break policy.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Sort by `column` in `order` as soon as the proxy is built.
    #[must_use]
    pub fn with_initial_sort(mut self, column: usize, order: SortOrder) -> Self {
        self.initial_sort = Some(InitialSort { column, order });
        self
    }

    /// Parse from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Parse from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }
}

/// Error loading a [`ProxyConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
