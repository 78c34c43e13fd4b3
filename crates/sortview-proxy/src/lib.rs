#![forbid(unsafe_code)]

//! Sorting proxy for sortview models.
//!
//! # Role in sortview
//! `sortview-proxy` sits between a data source and its views. It implements
//! [`Model`](sortview_model::Model) itself, so a view, or another proxy, can
//! be attached to it exactly as to the source.
//!
//! # Primary responsibilities
//! - **SortingProxyModel**: translates indexes between sorted (proxy) and
//!   unsorted (source) coordinates, one parent at a time.
//! - **MappingCache**: per-parent permutations, built on first use and
//!   dropped wholesale on any change.
//! - **SortComparator**: the ordering relation; case-insensitive by default.
//! - **ProxyConfig**: sort role, tie-break policy and initial sort, from code,
//!   the environment or (with the `config` feature) TOML/JSON files.
//!
//! # How it fits in the system
//! Views ask the proxy for rows; the proxy asks the source for the key
//! column's values once per parent, sorts row numbers, and serves every later
//! request from the cached permutation until the source or the sort changes.

pub mod comparator;
pub mod config;
pub mod error;
pub mod mapping;
pub mod proxy;
mod sort;

pub use comparator::{CaseInsensitive, Natural, SortComparator};
pub use config::{ConfigError, InitialSort, ProxyConfig, SortOrder, TieBreak};
pub use error::ProxyError;
pub use mapping::{Mapping, MappingCache, MappingId, MappingStats};
pub use proxy::SortingProxyModel;
