//! The hierarchical model contract.

use crate::index::{ModelId, ModelIndex};
use crate::notify::{UpdateFlags, UpdateNotifier};
use crate::variant::Variant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which representation of a cell is being requested.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// The value shown to the user.
    #[default]
    Display,
    /// The value used for ordering. Sources without a dedicated sort value
    /// answer with the display value.
    Sort,
    /// Hover text.
    Tooltip,
    /// Application-defined role.
    Custom(u16),
}

/// A tree of rows and columns addressed by [`ModelIndex`].
///
/// Every index passed in must either be invalid (meaning the root) or have
/// been issued by this same model. All methods take `&self`; models that
/// mutate keep their state behind interior mutability and announce changes
/// through [`notifier`](Model::notifier).
pub trait Model {
    /// Identity stamped on every index this model issues.
    fn model_id(&self) -> ModelId;

    /// Number of child rows under `parent`.
    fn row_count(&self, parent: &ModelIndex) -> usize;

    /// Number of columns under `parent`.
    fn column_count(&self, parent: &ModelIndex) -> usize;

    /// Index of the cell at `(row, column)` under `parent`, or the invalid
    /// index when out of range.
    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex;

    /// Parent of `index` (column 0), or the invalid index for top-level rows.
    fn parent_index(&self, index: &ModelIndex) -> ModelIndex;

    /// Value of the cell at `index` for `role`.
    fn data(&self, index: &ModelIndex, role: Role) -> Variant;

    /// Header text for `column`.
    fn column_name(&self, _column: usize) -> String {
        String::new()
    }

    /// Whether views may offer sorting on `column`.
    fn is_column_sortable(&self, _column: usize) -> bool {
        true
    }

    /// MIME-like type of drag payloads produced from this model.
    fn drag_data_type(&self) -> Option<&str> {
        None
    }

    /// Ask the model to refresh itself from its backing store.
    fn update(&self) {}

    /// Change notification registry.
    fn notifier(&self) -> &UpdateNotifier;

    /// Mint an index owned by this model.
    fn create_index(&self, row: usize, column: usize, internal_id: u64) -> ModelIndex {
        ModelIndex::new(self.model_id(), row, column, internal_id)
    }

    /// Whether `index` was issued by this model.
    fn owns(&self, index: &ModelIndex) -> bool {
        index.model() == Some(self.model_id())
    }

    /// Whether `index` still addresses an existing cell.
    fn is_within_range(&self, index: &ModelIndex) -> bool {
        if !self.owns(index) {
            return false;
        }
        let parent = self.parent_index(index);
        index.row() < self.row_count(&parent) && index.column() < self.column_count(&parent)
    }

    /// Announce a change to every attached client.
    fn did_update(&self, flags: UpdateFlags) {
        self.notifier().notify(flags);
    }
}
