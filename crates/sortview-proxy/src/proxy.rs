//! The sorting proxy.
//!
//! [`SortingProxyModel`] presents a sorted view of any [`Model`] without
//! touching it. Rows are reordered per parent: the first time a parent's
//! children are addressed, their order is computed once and cached as a
//! [`Mapping`]. Every proxy index carries the id of the mapping it was
//! issued from, which is how it finds its way back to source space.
//!
//! # Invalidation
//!
//! Any source notification, sort-key change, sort-role change or comparator
//! swap clears the whole cache and forwards an update to the proxy's own
//! clients. Indexes issued before the clear resolve to the invalid index.
//!
//! # Re-entrancy
//!
//! A build queries the source (`row_count`, `index`, `data`). If the source
//! announces a change while a build is in progress, the announcement is held
//! back until the build finishes; the cache is then cleared, the update
//! forwarded, and the requested mapping rebuilt from fresh source state.
//!
//! # Failure Modes
//!
//! Passing an index issued by another model, or a proxy index whose mapping
//! id does not exist in the current epoch, panics. These are consumer bugs;
//! continuing would translate into the wrong rows.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use sortview_model::{
    Model, ModelId, ModelIndex, Role, Subscription, UpdateFlags, UpdateNotifier, Variant,
};
use tracing::{debug, debug_span, trace, warn};
use web_time::Instant;

use crate::comparator::{self, CaseInsensitive, SortComparator};
use crate::config::{ProxyConfig, SortOrder, TieBreak};
use crate::error::ProxyError;
use crate::mapping::{Lookup, Mapping, MappingCache, MappingId, MappingStats};
use crate::sort;

/// How many times a build is restarted because the source changed under it
/// before the last build is kept as-is.
const MAX_BUILD_RESTARTS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortState {
    key_column: Option<usize>,
    order: SortOrder,
    role: Role,
    tie_break: TieBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvalidationReason {
    SourceUpdate,
    SortChanged,
    Explicit,
    ReentrantSourceUpdate,
}

impl InvalidationReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::SourceUpdate => "source_update",
            Self::SortChanged => "sort_changed",
            Self::Explicit => "explicit",
            Self::ReentrantSourceUpdate => "reentrant_source_update",
        }
    }
}

/// State reachable from the source's notification callback.
struct ProxyShared {
    cache: RefCell<MappingCache>,
    notifier: UpdateNotifier,
    build_depth: Cell<u32>,
    deferred: Cell<Option<UpdateFlags>>,
}

impl ProxyShared {
    fn request_invalidate(&self, reason: InvalidationReason, flags: UpdateFlags) {
        if self.build_depth.get() > 0 {
            let pending = self.deferred.get().map_or(flags, |p| p | flags);
            self.deferred.set(Some(pending));
            trace!(reason = reason.as_str(), "sort_proxy.invalidate_deferred");
            return;
        }
        self.invalidate(reason, flags);
    }

    fn invalidate(&self, reason: InvalidationReason, flags: UpdateFlags) {
        let (dropped, epoch) = {
            let mut cache = self.cache.borrow_mut();
            let dropped = cache.clear();
            (dropped, cache.epoch())
        };
        debug!(reason = reason.as_str(), dropped, epoch, "sort_proxy.invalidate");
        self.notifier.notify(flags);
    }
}

/// Restores the build depth when a build ends, including by unwinding.
struct BuildGuard<'a> {
    depth: &'a Cell<u32>,
    previous: u32,
}

impl<'a> BuildGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        let previous = depth.get();
        depth.set(previous + 1);
        Self { depth, previous }
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.previous);
    }
}

/// A [`Model`] that shows its source's rows sorted by one column.
///
/// The proxy subscribes to the source on construction and unsubscribes when
/// dropped. It owns its mapping cache; two proxies over the same source
/// share nothing.
pub struct SortingProxyModel {
    id: ModelId,
    source: Rc<dyn Model>,
    shared: Rc<ProxyShared>,
    sort: Cell<SortState>,
    comparator: Box<dyn SortComparator>,
    _source_subscription: Subscription,
}

impl fmt::Debug for SortingProxyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sort = self.sort.get();
        f.debug_struct("SortingProxyModel")
            .field("id", &self.id)
            .field("source", &self.source.model_id())
            .field("key_column", &sort.key_column)
            .field("order", &sort.order)
            .field("role", &sort.role)
            .field("stats", &self.stats())
            .finish()
    }
}

impl SortingProxyModel {
    /// Wrap `source` with no active sort (rows in source order).
    #[must_use]
    pub fn new(source: Rc<dyn Model>) -> Self {
        Self::from_parts(source, &ProxyConfig::default())
    }

    /// Wrap `source` using `config`, applying its initial sort if any.
    pub fn with_config(source: Rc<dyn Model>, config: ProxyConfig) -> Result<Self, ProxyError> {
        let proxy = Self::from_parts(source, &config);
        if let Some(initial) = config.initial_sort {
            proxy.set_key_column_and_sort_order(initial.column, initial.order)?;
        }
        Ok(proxy)
    }

    fn from_parts(source: Rc<dyn Model>, config: &ProxyConfig) -> Self {
        let shared = Rc::new(ProxyShared {
            cache: RefCell::new(MappingCache::new()),
            notifier: UpdateNotifier::new(),
            build_depth: Cell::new(0),
            deferred: Cell::new(None),
        });
        let weak: Weak<ProxyShared> = Rc::downgrade(&shared);
        let subscription = source.notifier().subscribe(move |flags| {
            if let Some(shared) = weak.upgrade() {
                shared.request_invalidate(InvalidationReason::SourceUpdate, flags);
            }
        });
        Self {
            id: ModelId::next(),
            source,
            shared,
            sort: Cell::new(SortState {
                key_column: None,
                order: SortOrder::Ascending,
                role: config.sort_role,
                tie_break: config.tie_break,
            }),
            comparator: Box::new(CaseInsensitive),
            _source_subscription: subscription,
        }
    }

    /// Replace the ordering relation.
    #[must_use]
    pub fn with_comparator(mut self, comparator: impl SortComparator + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self.shared
            .request_invalidate(InvalidationReason::SortChanged, UpdateFlags::default());
        self
    }

    /// The wrapped model.
    #[must_use]
    pub fn source(&self) -> &Rc<dyn Model> {
        &self.source
    }

    // ── Sort state ──────────────────────────────────────────────────

    /// Active key column, or `None` when unsorted.
    #[must_use]
    pub fn key_column(&self) -> Option<usize> {
        self.sort.get().key_column
    }

    /// Active sort direction.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort.get().order
    }

    /// Role whose values are compared.
    #[must_use]
    pub fn sort_role(&self) -> Role {
        self.sort.get().role
    }

    /// Ordering among rows with equal keys.
    #[must_use]
    pub fn tie_break(&self) -> TieBreak {
        self.sort.get().tie_break
    }

    /// Sort children of every parent by `column` in `order`.
    ///
    /// Setting the pair that is already active does nothing. Otherwise the
    /// column must be below the source's column count and sortable; the
    /// request is rejected before anything changes if not.
    pub fn set_key_column_and_sort_order(
        &self,
        column: usize,
        order: SortOrder,
    ) -> Result<(), ProxyError> {
        let state = self.sort.get();
        if state.key_column == Some(column) && state.order == order {
            return Ok(());
        }
        let column_count = self.root_column_count();
        if column >= column_count {
            return Err(ProxyError::KeyColumnOutOfRange {
                column,
                column_count,
            });
        }
        if !self.source.is_column_sortable(column) {
            return Err(ProxyError::ColumnNotSortable { column });
        }
        self.sort.set(SortState {
            key_column: Some(column),
            order,
            ..state
        });
        debug!(column, order = ?order, "sort_proxy.set_sort_key");
        self.shared
            .request_invalidate(InvalidationReason::SortChanged, UpdateFlags::default());
        Ok(())
    }

    /// Return to source order.
    pub fn clear_sort(&self) {
        let state = self.sort.get();
        if state.key_column.is_none() {
            return;
        }
        self.sort.set(SortState {
            key_column: None,
            ..state
        });
        self.shared
            .request_invalidate(InvalidationReason::SortChanged, UpdateFlags::default());
    }

    /// Change the role whose values are compared.
    pub fn set_sort_role(&self, role: Role) {
        let state = self.sort.get();
        if state.role == role {
            return;
        }
        self.sort.set(SortState { role, ..state });
        self.shared
            .request_invalidate(InvalidationReason::SortChanged, UpdateFlags::default());
    }

    /// Change how rows with equal keys are ordered.
    pub fn set_tie_break(&self, tie_break: TieBreak) {
        let state = self.sort.get();
        if state.tie_break == tie_break {
            return;
        }
        self.sort.set(SortState { tie_break, ..state });
        self.shared
            .request_invalidate(InvalidationReason::SortChanged, UpdateFlags::default());
    }

    /// Whether the source cell at `a` orders before the one at `b` under the
    /// active comparator and role. Both are source-space indexes.
    #[must_use]
    pub fn less_than(&self, a: &ModelIndex, b: &ModelIndex) -> bool {
        comparator::less_than(
            &*self.source,
            &*self.comparator,
            a,
            b,
            self.sort.get().role,
        )
    }

    // ── Mapping cache ───────────────────────────────────────────────

    /// Drop every cached mapping and notify clients.
    pub fn invalidate(&self) {
        self.shared
            .request_invalidate(InvalidationReason::Explicit, UpdateFlags::default());
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> MappingStats {
        self.shared.cache.borrow().stats()
    }

    /// Number of cached mappings.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.shared.cache.borrow().len()
    }

    /// Copy of the mapping named by `id`, if it is still current.
    #[must_use]
    pub fn mapping(&self, id: MappingId) -> Option<Mapping> {
        match self.shared.cache.borrow().lookup(id) {
            Lookup::Live(mapping) => Some(mapping.clone()),
            Lookup::Stale | Lookup::Missing => None,
        }
    }

    /// Ensure a mapping for the children of `source_parent` exists, and for
    /// every ancestor of it up to the root. Returns the cached mapping's id;
    /// calling again without an intervening invalidation returns the same id
    /// without touching the source.
    ///
    /// # Panics
    ///
    /// Panics if `source_parent` is valid but was not issued by the source.
    pub fn build_mapping(&self, source_parent: &ModelIndex) -> MappingId {
        assert!(
            !source_parent.is_valid() || self.source.owns(source_parent),
            "index {source_parent} was not issued by source model {}",
            self.source.model_id()
        );
        let source_parent = &self.canonical_parent(source_parent);
        if let Some(id) = self.shared.cache.borrow_mut().find(source_parent) {
            trace!(parent = %source_parent, mapping = %id, "sort_proxy.cache_hit");
            return id;
        }

        let mut restarts = 0;
        loop {
            let guard = BuildGuard::enter(&self.shared.build_depth);
            let mapping = self.sort_children(source_parent);
            if source_parent.is_valid() {
                let grandparent = self.source.parent_index(source_parent);
                self.build_mapping(&grandparent);
            }
            drop(guard);

            if self.shared.build_depth.get() == 0
                && let Some(flags) = self.shared.deferred.take()
            {
                self.shared
                    .invalidate(InvalidationReason::ReentrantSourceUpdate, flags);
                if restarts < MAX_BUILD_RESTARTS {
                    restarts += 1;
                    warn!(parent = %source_parent, restarts, "sort_proxy.build_restarted");
                    continue;
                }
                warn!(parent = %source_parent, restarts, "sort_proxy.build_restart_limit");
            }
            return self.shared.cache.borrow_mut().insert(mapping);
        }
    }

    /// A parent is keyed by the column-0 cell of its row, whichever column
    /// it was addressed through.
    fn canonical_parent(&self, source_parent: &ModelIndex) -> ModelIndex {
        if !source_parent.is_valid() || source_parent.column() == 0 {
            return *source_parent;
        }
        let grandparent = self.source.parent_index(source_parent);
        let canonical = self.source.index(source_parent.row(), 0, &grandparent);
        if canonical.is_valid() {
            canonical
        } else {
            *source_parent
        }
    }

    /// Compute the child order of one parent. Holds no cache borrow, since
    /// the source may call back into the proxy through its notifier.
    fn sort_children(&self, source_parent: &ModelIndex) -> Mapping {
        let state = self.sort.get();
        let span = debug_span!(
            "sort_proxy.build_mapping",
            parent = %source_parent,
            key_column = ?state.key_column,
            row_count = tracing::field::Empty,
            sorted = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        let _enter = span.enter();
        let start = Instant::now();

        let row_count = self.source.row_count(source_parent);
        span.record("row_count", row_count as u64);

        let mapping = match state.key_column {
            None => Mapping::identity(*source_parent, row_count),
            Some(key_column) => {
                let keys: Vec<Variant> = (0..row_count)
                    .map(|row| {
                        let cell = self.source.index(row, key_column, source_parent);
                        comparator::cell_value(&*self.source, &cell, state.role)
                    })
                    .collect();
                let comparator = &*self.comparator;
                let compare = |a: &usize, b: &usize| {
                    let ordering = comparator.compare(&keys[*a], &keys[*b]);
                    match state.order {
                        SortOrder::Ascending => ordering,
                        SortOrder::Descending => ordering.reverse(),
                    }
                };
                let mut source_rows: Vec<usize> = (0..row_count).collect();
                match state.tie_break {
                    TieBreak::Unspecified => sort::heap_sort_by(&mut source_rows, compare),
                    TieBreak::SourceOrder => sort::merge_sort_by(&mut source_rows, compare),
                }
                Mapping::from_source_rows(*source_parent, source_rows)
            }
        };

        span.record("sorted", state.key_column.is_some());
        span.record("duration_us", start.elapsed().as_micros() as u64);
        mapping
    }

    // ── Coordinate translation ──────────────────────────────────────

    /// Source-space index for `proxy_index`.
    ///
    /// Returns the invalid index when `proxy_index` is invalid, stale, or out
    /// of range for its mapping or the column count.
    ///
    /// # Panics
    ///
    /// Panics if `proxy_index` was issued by another model or is not bound to
    /// a mapping of the current epoch.
    #[must_use]
    pub fn map_to_source(&self, proxy_index: &ModelIndex) -> ModelIndex {
        if !proxy_index.is_valid() {
            return ModelIndex::invalid();
        }
        let resolved = {
            let cache = self.shared.cache.borrow();
            self.resolve(&cache, proxy_index).and_then(|mapping| {
                mapping
                    .source_row(proxy_index.row())
                    .map(|row| (row, *mapping.source_parent()))
            })
        };
        let Some((source_row, source_parent)) = resolved else {
            return ModelIndex::invalid();
        };
        if proxy_index.column() >= self.root_column_count() {
            return ModelIndex::invalid();
        }
        self.source
            .index(source_row, proxy_index.column(), &source_parent)
    }

    /// Proxy-space index for `source_index`, building its parent's mapping
    /// if needed.
    ///
    /// # Panics
    ///
    /// Panics if `source_index` is valid but was not issued by the source.
    #[must_use]
    pub fn map_to_proxy(&self, source_index: &ModelIndex) -> ModelIndex {
        if !source_index.is_valid() {
            return ModelIndex::invalid();
        }
        assert!(
            self.source.owns(source_index),
            "index {source_index} was not issued by source model {}",
            self.source.model_id()
        );
        let source_parent = self.source.parent_index(source_index);
        let id = self.build_mapping(&source_parent);
        let proxy_row = match self.shared.cache.borrow().lookup(id) {
            Lookup::Live(mapping) => mapping.proxy_row(source_index.row()),
            Lookup::Stale | Lookup::Missing => None,
        };
        let Some(proxy_row) = proxy_row else {
            return ModelIndex::invalid();
        };
        if source_index.column() >= self.root_column_count() {
            return ModelIndex::invalid();
        }
        self.create_index(proxy_row, source_index.column(), id.pack())
    }

    fn resolve<'c>(&self, cache: &'c MappingCache, proxy_index: &ModelIndex) -> Option<&'c Mapping> {
        assert_eq!(
            proxy_index.model(),
            Some(self.id),
            "index {proxy_index} was not issued by sorting proxy {}",
            self.id
        );
        let id = MappingId::unpack(proxy_index.internal_id());
        match cache.lookup(id) {
            Lookup::Live(mapping) => Some(mapping),
            Lookup::Stale => {
                trace!(index = %proxy_index, mapping = %id, "sort_proxy.stale_index");
                None
            }
            Lookup::Missing => {
                panic!("proxy index {proxy_index} is not bound to a cached mapping ({id})")
            }
        }
    }

    fn root_column_count(&self) -> usize {
        self.source.column_count(&ModelIndex::invalid())
    }

    /// Source index for a proxy parent, or `None` when a valid proxy parent
    /// no longer resolves.
    fn source_parent_of(&self, proxy_parent: &ModelIndex) -> Option<ModelIndex> {
        let source_parent = self.map_to_source(proxy_parent);
        if proxy_parent.is_valid() && !source_parent.is_valid() {
            None
        } else {
            Some(source_parent)
        }
    }
}

impl Model for SortingProxyModel {
    fn model_id(&self) -> ModelId {
        self.id
    }

    fn row_count(&self, parent: &ModelIndex) -> usize {
        self.source_parent_of(parent)
            .map_or(0, |source_parent| self.source.row_count(&source_parent))
    }

    fn column_count(&self, parent: &ModelIndex) -> usize {
        self.source_parent_of(parent)
            .map_or(0, |source_parent| self.source.column_count(&source_parent))
    }

    fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        let Some(source_parent) = self.source_parent_of(parent) else {
            return ModelIndex::invalid();
        };
        let id = self.build_mapping(&source_parent);
        let row_count = match self.shared.cache.borrow().lookup(id) {
            Lookup::Live(mapping) => mapping.len(),
            Lookup::Stale | Lookup::Missing => return ModelIndex::invalid(),
        };
        if row >= row_count || column >= self.root_column_count() {
            return ModelIndex::invalid();
        }
        self.create_index(row, column, id.pack())
    }

    fn parent_index(&self, index: &ModelIndex) -> ModelIndex {
        if !index.is_valid() {
            return ModelIndex::invalid();
        }
        let source_parent = {
            let cache = self.shared.cache.borrow();
            self.resolve(&cache, index)
                .map(|mapping| *mapping.source_parent())
        };
        match source_parent {
            Some(source_parent) => self.map_to_proxy(&source_parent),
            None => ModelIndex::invalid(),
        }
    }

    fn data(&self, index: &ModelIndex, role: Role) -> Variant {
        let source_index = self.map_to_source(index);
        comparator::cell_value(&*self.source, &source_index, role)
    }

    fn column_name(&self, column: usize) -> String {
        self.source.column_name(column)
    }

    fn is_column_sortable(&self, column: usize) -> bool {
        self.source.is_column_sortable(column)
    }

    fn drag_data_type(&self) -> Option<&str> {
        self.source.drag_data_type()
    }

    fn update(&self) {
        self.source.update();
    }

    fn notifier(&self) -> &UpdateNotifier {
        &self.shared.notifier
    }
}
