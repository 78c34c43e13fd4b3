//! Per-parent row permutations and the arena that owns them.
//!
//! # Addressing
//!
//! Mappings live in slots of a [`MappingCache`]. A [`MappingId`] names a slot
//! *and* the cache epoch it was created in; [`MappingCache::clear`] bumps the
//! epoch, so an id issued before a clear resolves as [`Lookup::Stale`]
//! instead of reaching a mapping that belongs to a different parent.
//!
//! # Invariants
//!
//! 1. `proxy_rows[source_rows[i]] == i` for every `i`.
//! 2. `source_rows.len() == proxy_rows.len()`.
//! 3. A mapping is inserted fully built or not at all.
//! 4. At most one live mapping per source parent.

use rustc_hash::FxHashMap;
use sortview_model::ModelIndex;

// ============================================================================
// Mapping
// ============================================================================

/// Bidirectional permutation between source and proxy child-row order for one
/// source parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    source_parent: ModelIndex,
    source_rows: Vec<usize>,
    proxy_rows: Vec<usize>,
}

impl Mapping {
    /// Identity permutation over `row_count` rows.
    #[must_use]
    pub fn identity(source_parent: ModelIndex, row_count: usize) -> Self {
        let rows: Vec<usize> = (0..row_count).collect();
        Self {
            source_parent,
            proxy_rows: rows.clone(),
            source_rows: rows,
        }
    }

    /// Build from the sorted order: `source_rows[i]` is the source row shown
    /// at proxy row `i`. The inverse is derived here.
    ///
    /// # Panics
    ///
    /// Panics if `source_rows` is not a permutation of `0..len`.
    #[must_use]
    pub fn from_source_rows(source_parent: ModelIndex, source_rows: Vec<usize>) -> Self {
        const UNSET: usize = usize::MAX;
        let mut proxy_rows = vec![UNSET; source_rows.len()];
        for (proxy_row, &source_row) in source_rows.iter().enumerate() {
            assert!(
                source_row < proxy_rows.len() && proxy_rows[source_row] == UNSET,
                "source row order is not a permutation (row {source_row})"
            );
            proxy_rows[source_row] = proxy_row;
        }
        Self {
            source_parent,
            source_rows,
            proxy_rows,
        }
    }

    /// The source-space parent this mapping orders the children of.
    #[must_use]
    pub fn source_parent(&self) -> &ModelIndex {
        &self.source_parent
    }

    /// Source row at each proxy position.
    #[must_use]
    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Proxy position of each source row.
    #[must_use]
    pub fn proxy_rows(&self) -> &[usize] {
        &self.proxy_rows
    }

    /// Number of child rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source_rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_rows.is_empty()
    }

    /// Source row shown at `proxy_row`.
    #[inline]
    #[must_use]
    pub fn source_row(&self, proxy_row: usize) -> Option<usize> {
        self.source_rows.get(proxy_row).copied()
    }

    /// Proxy position of `source_row`.
    #[inline]
    #[must_use]
    pub fn proxy_row(&self, source_row: usize) -> Option<usize> {
        self.proxy_rows.get(source_row).copied()
    }
}

// ============================================================================
// MappingId
// ============================================================================

/// Handle to a mapping in a [`MappingCache`], valid for one cache epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingId {
    epoch: u32,
    slot: u32,
}

impl MappingId {
    /// Pack into the `internal_id` of a proxy [`ModelIndex`].
    #[inline]
    #[must_use]
    pub const fn pack(self) -> u64 {
        ((self.epoch as u64) << 32) | self.slot as u64
    }

    /// Inverse of [`pack`](Self::pack).
    #[inline]
    #[must_use]
    pub const fn unpack(raw: u64) -> Self {
        Self {
            epoch: (raw >> 32) as u32,
            slot: raw as u32,
        }
    }

    #[must_use]
    pub const fn epoch(self) -> u32 {
        self.epoch
    }

    #[must_use]
    pub const fn slot(self) -> u32 {
        self.slot
    }
}

impl std::fmt::Display for MappingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}:S{}", self.epoch, self.slot)
    }
}

// ============================================================================
// MappingStats
// ============================================================================

/// Counters for the mapping cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    /// Mappings built (inserted) since construction.
    pub builds: u64,
    /// Lookups by parent answered from the cache.
    pub hits: u64,
    /// Whole-cache clears.
    pub invalidations: u64,
    /// Mappings currently cached.
    pub live: usize,
    /// Current epoch.
    pub epoch: u32,
}

impl MappingStats {
    /// Fraction of parent lookups answered from the cache (0.0 – 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.builds;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// MappingCache
// ============================================================================

/// Result of resolving a [`MappingId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The mapping is current.
    Live(&'a Mapping),
    /// The id predates the last clear.
    Stale,
    /// The id claims the current epoch but no such slot exists, or the slot's
    /// parent is not registered under this id.
    Missing,
}

/// Arena of mappings keyed by source parent.
#[derive(Debug, Default)]
pub struct MappingCache {
    slots: Vec<Mapping>,
    by_parent: FxHashMap<ModelIndex, u32>,
    epoch: u32,
    builds: u64,
    hits: u64,
    invalidations: u64,
}

impl MappingCache {
    /// Create an empty cache at epoch 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the mapping for `source_parent`, counting a hit when found.
    pub fn find(&mut self, source_parent: &ModelIndex) -> Option<MappingId> {
        let slot = *self.by_parent.get(source_parent)?;
        self.hits += 1;
        Some(MappingId {
            epoch: self.epoch,
            slot,
        })
    }

    /// Store a fully built mapping.
    ///
    /// If a mapping for the same parent is already cached it is kept and its
    /// id returned; the new one is dropped.
    pub fn insert(&mut self, mapping: Mapping) -> MappingId {
        if let Some(&slot) = self.by_parent.get(mapping.source_parent()) {
            return MappingId {
                epoch: self.epoch,
                slot,
            };
        }
        let slot = u32::try_from(self.slots.len()).expect("mapping arena exceeds u32 slots");
        self.by_parent.insert(*mapping.source_parent(), slot);
        self.slots.push(mapping);
        self.builds += 1;
        MappingId {
            epoch: self.epoch,
            slot,
        }
    }

    /// Resolve an id.
    #[must_use]
    pub fn lookup(&self, id: MappingId) -> Lookup<'_> {
        if id.epoch != self.epoch {
            return Lookup::Stale;
        }
        match self.slots.get(id.slot as usize) {
            Some(mapping) if self.by_parent.get(mapping.source_parent()) == Some(&id.slot) => {
                Lookup::Live(mapping)
            }
            _ => Lookup::Missing,
        }
    }

    /// Drop every mapping and start a new epoch. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.slots.len();
        self.slots.clear();
        self.by_parent.clear();
        self.epoch = self.epoch.wrapping_add(1);
        self.invalidations += 1;
        dropped
    }

    /// Number of cached mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> MappingStats {
        MappingStats {
            builds: self.builds,
            hits: self.hits,
            invalidations: self.invalidations,
            live: self.slots.len(),
            epoch: self.epoch,
        }
    }
}
