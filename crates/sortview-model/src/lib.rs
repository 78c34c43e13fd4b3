#![forbid(unsafe_code)]

//! Hierarchical data-source contract for sortview.
//!
//! # Role in sortview
//! `sortview-model` defines the addressing scheme and query surface shared by
//! every data source and every layer stacked on top of one. The sorting proxy
//! (`sortview-proxy`) consumes a [`Model`] and exposes the same trait, so views
//! cannot tell whether a sort layer sits between them and the data.
//!
//! # Primary responsibilities
//! - **ModelIndex**: `(row, column, internal id, origin model)` cell address.
//! - **Variant** / **Role**: dynamic cell values and which representation of
//!   a cell is being asked for.
//! - **UpdateNotifier**: "something changed" fan-out to attached clients.
//! - **TreeModel**: in-memory reference source used by tests and tools.

pub mod index;
pub mod model;
pub mod notify;
pub mod tree;
pub mod variant;

pub use index::{ModelId, ModelIndex};
pub use model::{Model, Role};
pub use notify::{Subscription, UpdateFlags, UpdateNotifier};
pub use tree::{ModelError, TreeModel, TreeRow};
pub use variant::Variant;
