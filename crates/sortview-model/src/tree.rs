//! In-memory hierarchical model.
//!
//! [`TreeModel`] stores rows in a slot arena. Slot 0 is the implicit root;
//! every other slot is one row, and a row's [`ModelIndex`] carries its slot
//! in `internal_id`. Removed rows leave a tombstone behind, so an index to a
//! removed row never aliases a newer one.
//!
//! # Example
//!
//! ```
//! use sortview_model::{Model, ModelIndex, Role, TreeModel, TreeRow, Variant};
//!
//! let model = TreeModel::new(["name", "size"]);
//! let root = ModelIndex::invalid();
//! model.append_row(&root, TreeRow::new(["src", "4"]).child(TreeRow::new(["lib.rs", "1"])))?;
//! model.append_row(&root, TreeRow::new(["Cargo.toml", "1"]))?;
//!
//! assert_eq!(model.row_count(&root), 2);
//! let src = model.index(0, 0, &root);
//! assert_eq!(model.row_count(&src), 1);
//! assert_eq!(model.data(&src, Role::Display), Variant::from("src"));
//! # Ok::<(), sortview_model::ModelError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::index::{ModelId, ModelIndex};
use crate::model::{Model, Role};
use crate::notify::{UpdateFlags, UpdateNotifier};
use crate::variant::Variant;

const ROOT: u32 = 0;

/// A row to be inserted into a [`TreeModel`], with optional children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeRow {
    values: Vec<Variant>,
    sort_values: Vec<(usize, Variant)>,
    children: Vec<TreeRow>,
}

impl TreeRow {
    /// Create a row from one display value per column.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = impl Into<Variant>>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            sort_values: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Give `column` a sort value distinct from its display value.
    #[must_use]
    pub fn with_sort_value(mut self, column: usize, value: impl Into<Variant>) -> Self {
        self.sort_values.push((column, value.into()));
        self
    }

    /// Add a child row.
    #[must_use]
    pub fn child(mut self, row: TreeRow) -> Self {
        self.children.push(row);
        self
    }

    /// Set children from a vec.
    #[must_use]
    pub fn with_children(mut self, rows: Vec<TreeRow>) -> Self {
        self.children = rows;
        self
    }

    /// Display values, one per column.
    #[must_use]
    pub fn values(&self) -> &[Variant] {
        &self.values
    }

    /// Child rows.
    #[must_use]
    pub fn children(&self) -> &[TreeRow] {
        &self.children
    }
}

/// Error returned by [`TreeModel`] mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The index was issued by another model or addresses a removed row.
    UnknownIndex(ModelIndex),
    /// Row position beyond the parent's child count.
    RowOutOfRange { row: usize, row_count: usize },
    /// Column beyond the model's column count.
    ColumnOutOfRange { column: usize, column_count: usize },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownIndex(index) => write!(f, "index {index} does not address a row"),
            Self::RowOutOfRange { row, row_count } => {
                write!(f, "row {row} out of range (parent has {row_count} rows)")
            }
            Self::ColumnOutOfRange {
                column,
                column_count,
            } => write!(f, "column {column} out of range (model has {column_count} columns)"),
        }
    }
}

impl std::error::Error for ModelError {}

#[derive(Debug, Clone)]
struct Node {
    values: Vec<Variant>,
    sort_values: Vec<Option<Variant>>,
    parent: u32,
    children: Vec<u32>,
}

impl Node {
    fn root() -> Self {
        Self {
            values: Vec::new(),
            sort_values: Vec::new(),
            parent: ROOT,
            children: Vec::new(),
        }
    }
}

/// Arena-backed tree of rows implementing [`Model`].
///
/// Mutations take `&self` so the model can be shared (`Rc<TreeModel>`) with
/// the layers stacked on top of it; each mutation announces itself through
/// the notifier once its borrow of the arena has ended.
pub struct TreeModel {
    id: ModelId,
    columns: Vec<String>,
    sortable: Vec<bool>,
    drag_data_type: Option<String>,
    nodes: RefCell<Vec<Option<Node>>>,
    notifier: UpdateNotifier,
    row_count_queries: Cell<u64>,
    data_queries: Cell<u64>,
    update_requests: Cell<u64>,
}

impl fmt::Debug for TreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("id", &self.id)
            .field("columns", &self.columns)
            .field("rows", &self.len())
            .finish()
    }
}

impl TreeModel {
    /// Create an empty model with the given column headers.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            id: ModelId::next(),
            sortable: vec![true; columns.len()],
            columns,
            drag_data_type: None,
            nodes: RefCell::new(vec![Some(Node::root())]),
            notifier: UpdateNotifier::new(),
            row_count_queries: Cell::new(0),
            data_queries: Cell::new(0),
            update_requests: Cell::new(0),
        }
    }

    /// Mark `column` as not offering sorting.
    #[must_use]
    pub fn with_unsortable_column(mut self, column: usize) -> Self {
        if let Some(flag) = self.sortable.get_mut(column) {
            *flag = false;
        }
        self
    }

    /// Set the drag payload type.
    #[must_use]
    pub fn with_drag_data_type(mut self, ty: impl Into<String>) -> Self {
        self.drag_data_type = Some(ty.into());
        self
    }

    /// Total number of live rows at every depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.borrow().iter().flatten().count() - 1
    }

    /// Whether the model holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `row` (and its children) as the last child of `parent`.
    ///
    /// Returns the column-0 index of the new row.
    pub fn append_row(&self, parent: &ModelIndex, row: TreeRow) -> Result<ModelIndex, ModelError> {
        let position = self.row_count_unobserved(parent)?;
        self.insert_row(parent, position, row)
    }

    /// Insert `row` (and its children) at `position` under `parent`.
    pub fn insert_row(
        &self,
        parent: &ModelIndex,
        position: usize,
        row: TreeRow,
    ) -> Result<ModelIndex, ModelError> {
        let parent_slot = self.slot_of(parent).ok_or(ModelError::UnknownIndex(*parent))?;
        let slot = {
            let mut nodes = self.nodes.borrow_mut();
            let row_count = nodes[parent_slot as usize]
                .as_ref()
                .map_or(0, |n| n.children.len());
            if position > row_count {
                return Err(ModelError::RowOutOfRange {
                    row: position,
                    row_count,
                });
            }
            let slot = Self::materialize(&mut nodes, parent_slot, row, self.columns.len());
            if let Some(node) = nodes[parent_slot as usize].as_mut() {
                node.children.insert(position, slot);
            }
            slot
        };
        tracing::trace!(model = %self.id, parent = %parent, position, "tree_model.insert_row");
        self.notifier.notify(UpdateFlags::INVALIDATE_ALL_INDEXES);
        Ok(self.create_index(position, 0, u64::from(slot)))
    }

    /// Replace the display value at `index`.
    pub fn set_data(&self, index: &ModelIndex, value: impl Into<Variant>) -> Result<(), ModelError> {
        let value = value.into();
        self.edit_cell(index, |node, column| node.values[column] = value)
    }

    /// Replace the sort value at `index`.
    pub fn set_sort_data(
        &self,
        index: &ModelIndex,
        value: impl Into<Variant>,
    ) -> Result<(), ModelError> {
        let value = value.into();
        self.edit_cell(index, |node, column| node.sort_values[column] = Some(value))
    }

    /// Remove the row at `row` under `parent`, with its whole subtree.
    pub fn remove_row(&self, parent: &ModelIndex, row: usize) -> Result<(), ModelError> {
        let parent_slot = self.slot_of(parent).ok_or(ModelError::UnknownIndex(*parent))?;
        {
            let mut nodes = self.nodes.borrow_mut();
            let children = nodes[parent_slot as usize]
                .as_mut()
                .map(|n| &mut n.children)
                .ok_or(ModelError::UnknownIndex(*parent))?;
            if row >= children.len() {
                return Err(ModelError::RowOutOfRange {
                    row,
                    row_count: children.len(),
                });
            }
            let removed = children.remove(row);
            let mut stack = vec![removed];
            while let Some(slot) = stack.pop() {
                if let Some(node) = nodes[slot as usize].take() {
                    stack.extend(node.children);
                }
            }
        }
        tracing::trace!(model = %self.id, parent = %parent, row, "tree_model.remove_row");
        self.notifier.notify(UpdateFlags::INVALIDATE_ALL_INDEXES);
        Ok(())
    }

    /// Remove every row.
    pub fn clear(&self) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let tombstones = nodes.len();
            nodes.clear();
            nodes.resize_with(tombstones, || None);
            nodes[ROOT as usize] = Some(Node::root());
        }
        tracing::trace!(model = %self.id, "tree_model.clear");
        self.notifier.notify(UpdateFlags::INVALIDATE_ALL_INDEXES);
    }

    /// How many times [`Model::row_count`] has been called.
    #[must_use]
    pub fn row_count_queries(&self) -> u64 {
        self.row_count_queries.get()
    }

    /// How many times [`Model::data`] has been called.
    #[must_use]
    pub fn data_queries(&self) -> u64 {
        self.data_queries.get()
    }

    /// How many times [`Model::update`] has been called.
    #[must_use]
    pub fn update_requests(&self) -> u64 {
        self.update_requests.get()
    }

    /// Zero the query counters.
    pub fn reset_query_counters(&self) {
        self.row_count_queries.set(0);
        self.data_queries.set(0);
    }

    // ── Internal helpers ──────────────────────────────────────────

    /// Slot addressed by `index`; the invalid index is the root.
    fn slot_of(&self, index: &ModelIndex) -> Option<u32> {
        if !index.is_valid() {
            return Some(ROOT);
        }
        if !self.owns(index) {
            return None;
        }
        let slot = u32::try_from(index.internal_id()).ok()?;
        if slot == ROOT {
            return None;
        }
        let nodes = self.nodes.borrow();
        nodes.get(slot as usize)?.as_ref().map(|_| slot)
    }

    fn row_count_unobserved(&self, parent: &ModelIndex) -> Result<usize, ModelError> {
        let slot = self.slot_of(parent).ok_or(ModelError::UnknownIndex(*parent))?;
        Ok(self.nodes.borrow()[slot as usize]
            .as_ref()
            .map_or(0, |n| n.children.len()))
    }

    fn materialize(nodes: &mut Vec<Option<Node>>, parent: u32, row: TreeRow, columns: usize) -> u32 {
        let TreeRow {
            mut values,
            sort_values,
            children,
        } = row;
        values.resize(columns, Variant::Empty);
        let mut sorted = vec![None; columns];
        for (column, value) in sort_values {
            if let Some(cell) = sorted.get_mut(column) {
                *cell = Some(value);
            }
        }
        let slot = u32::try_from(nodes.len()).unwrap_or(u32::MAX);
        nodes.push(Some(Node {
            values,
            sort_values: sorted,
            parent,
            children: Vec::with_capacity(children.len()),
        }));
        for child in children {
            let child_slot = Self::materialize(nodes, slot, child, columns);
            if let Some(node) = nodes[slot as usize].as_mut() {
                node.children.push(child_slot);
            }
        }
        slot
    }

    fn edit_cell(
        &self,
        index: &ModelIndex,
        edit: impl FnOnce(&mut Node, usize),
    ) -> Result<(), ModelError> {
        if !index.is_valid() {
            return Err(ModelError::UnknownIndex(*index));
        }
        let slot = self.slot_of(index).ok_or(ModelError::UnknownIndex(*index))?;
        let column = index.column();
        if column >= self.columns.len() {
            return Err(ModelError::ColumnOutOfRange {
                column,
                column_count: self.columns.len(),
            });
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            let node = nodes[slot as usize]
                .as_mut()
                .ok_or(ModelError::UnknownIndex(*index))?;
            edit(node, column);
        }
        tracing::trace!(model = %self.id, index = %index, "tree_model.edit_cell");
        self.notifier.notify(UpdateFlags::INVALIDATE_ALL_INDEXES);
        Ok(())
    }
}

impl Model for TreeModel {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn row_count(&self, parent: &ModelIndex) -> usize {
        self.row_count_queries.set(self.row_count_queries.get() + 1);
        self.row_count_unobserved(parent).unwrap_or(0)
    }

    fn column_count(&self, parent: &ModelIndex) -> usize {
        match self.slot_of(parent) {
            Some(_) => self.columns.len(),
            None => 0,
        }
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if column >= self.columns.len() {
            return ModelIndex::invalid();
        }
        let Some(parent_slot) = self.slot_of(parent) else {
            return ModelIndex::invalid();
        };
        let child = self.nodes.borrow()[parent_slot as usize]
            .as_ref()
            .and_then(|n| n.children.get(row).copied());
        match child {
            Some(slot) => self.create_index(row, column, u64::from(slot)),
            None => ModelIndex::invalid(),
        }
    }

    fn parent_index(&self, index: &ModelIndex) -> ModelIndex {
        if !index.is_valid() {
            return ModelIndex::invalid();
        }
        let Some(slot) = self.slot_of(index) else {
            return ModelIndex::invalid();
        };
        let nodes = self.nodes.borrow();
        let Some(parent) = nodes[slot as usize].as_ref().map(|n| n.parent) else {
            return ModelIndex::invalid();
        };
        if parent == ROOT {
            return ModelIndex::invalid();
        }
        let position = nodes[parent as usize]
            .as_ref()
            .and_then(|p| nodes[p.parent as usize].as_ref())
            .and_then(|grand| grand.children.iter().position(|&c| c == parent));
        match position {
            Some(row) => self.create_index(row, 0, u64::from(parent)),
            None => ModelIndex::invalid(),
        }
    }

    fn data(&self, index: &ModelIndex, role: Role) -> Variant {
        self.data_queries.set(self.data_queries.get() + 1);
        if !index.is_valid() {
            return Variant::Empty;
        }
        let Some(slot) = self.slot_of(index) else {
            return Variant::Empty;
        };
        let nodes = self.nodes.borrow();
        let Some(node) = nodes[slot as usize].as_ref() else {
            return Variant::Empty;
        };
        let column = index.column();
        match role {
            Role::Display => node.values.get(column).cloned().unwrap_or_default(),
            Role::Sort => node
                .sort_values
                .get(column)
                .cloned()
                .flatten()
                .or_else(|| node.values.get(column).cloned())
                .unwrap_or_default(),
            Role::Tooltip | Role::Custom(_) => Variant::Empty,
        }
    }

    fn column_name(&self, column: usize) -> String {
        self.columns.get(column).cloned().unwrap_or_default()
    }

    fn is_column_sortable(&self, column: usize) -> bool {
        self.sortable.get(column).copied().unwrap_or(false)
    }

    fn drag_data_type(&self) -> Option<&str> {
        self.drag_data_type.as_deref()
    }

    fn update(&self) {
        self.update_requests.set(self.update_requests.get() + 1);
    }

    fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }
}
