#![forbid(unsafe_code)]

//! sortview public facade crate.
//!
//! Re-exports the model contract and the sorting proxy, and offers a single
//! error type and a prelude for day-to-day usage.

use std::fmt;
use std::rc::Rc;

// --- Model re-exports ------------------------------------------------------

pub use sortview_model::{
    Model, ModelError, ModelId, ModelIndex, Role, Subscription, TreeModel, TreeRow, UpdateFlags,
    UpdateNotifier, Variant,
};

// --- Proxy re-exports ------------------------------------------------------

pub use sortview_proxy::{
    CaseInsensitive, ConfigError, InitialSort, Mapping, MappingId, MappingStats, Natural,
    ProxyConfig, ProxyError, SortComparator, SortOrder, SortingProxyModel, TieBreak,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for sortview APIs.
#[derive(Debug)]
pub enum Error {
    /// Editing the source model failed.
    Model(ModelError),
    /// A sort request was rejected.
    Proxy(ProxyError),
    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(err) => write!(f, "{err}"),
            Self::Proxy(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::Proxy(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        Self::Model(err)
    }
}

impl From<ProxyError> for Error {
    fn from(err: ProxyError) -> Self {
        Self::Proxy(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for sortview APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Wrap `source` in a proxy configured from `SORTVIEW_*` environment
/// variables.
pub fn proxy_from_env(source: Rc<dyn Model>) -> Result<SortingProxyModel> {
    Ok(SortingProxyModel::with_config(source, ProxyConfig::from_env())?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, Model, ModelIndex, ProxyConfig, Result, Role, SortOrder, SortingProxyModel,
        TreeModel, TreeRow, Variant,
    };

    pub use crate::{model, proxy};
}

pub use sortview_model as model;
pub use sortview_proxy as proxy;
