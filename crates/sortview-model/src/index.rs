//! Cell addresses and model identity.
//!
//! A [`ModelIndex`] is only meaningful to the model that issued it. The
//! `internal_id` slot is opaque to everyone else: a tree source stores a node
//! key there, the sorting proxy stores a packed mapping handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one model instance.
///
/// Allocated from a process-wide counter, so two live models never share an
/// id even when they wrap the same data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    /// Allocate a fresh, never-before-seen id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Address of one cell inside a hierarchical model.
///
/// The default value is the invalid index, which doubles as "the parent of
/// every top-level row". Equality and hashing cover the origin model, so an
/// index issued by a proxy never compares equal to the source index it maps
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    internal_id: u64,
    model: Option<ModelId>,
}

impl ModelIndex {
    /// The "no node" index.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            internal_id: 0,
            model: None,
        }
    }

    /// Create an index owned by `model`.
    ///
    /// Only the model identified by `model` should mint indexes for itself;
    /// see [`Model::create_index`](crate::Model::create_index).
    #[must_use]
    pub const fn new(model: ModelId, row: usize, column: usize, internal_id: u64) -> Self {
        Self {
            row,
            column,
            internal_id,
            model: Some(model),
        }
    }

    /// Whether this index addresses a cell (as opposed to the root).
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.model.is_some()
    }

    /// Row within the parent.
    #[inline]
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Column within the row.
    #[inline]
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Model-private payload.
    #[inline]
    #[must_use]
    pub const fn internal_id(&self) -> u64 {
        self.internal_id
    }

    /// The model that issued this index, if any.
    #[inline]
    #[must_use]
    pub const fn model(&self) -> Option<ModelId> {
        self.model
    }
}

impl fmt::Display for ModelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            Some(model) => write!(f, "({}, {})@{model}", self.row, self.column),
            None => f.write_str("<root>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_invalid() {
        let index = ModelIndex::default();
        assert!(!index.is_valid());
        assert_eq!(index, ModelIndex::invalid());
        assert_eq!(index.model(), None);
    }

    #[test]
    fn model_ids_are_unique() {
        let a = ModelId::next();
        let b = ModelId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn equality_includes_origin_model() {
        let a = ModelId::next();
        let b = ModelId::next();
        assert_ne!(ModelIndex::new(a, 1, 0, 7), ModelIndex::new(b, 1, 0, 7));
        assert_eq!(ModelIndex::new(a, 1, 0, 7), ModelIndex::new(a, 1, 0, 7));
    }

    #[test]
    fn display_format() {
        let id = ModelId::next();
        let index = ModelIndex::new(id, 2, 3, 0);
        assert_eq!(index.to_string(), format!("(2, 3)@M{}", id.raw()));
        assert_eq!(ModelIndex::invalid().to_string(), "<root>");
    }
}
