//! Bounded side cache for detail rows.
//!
//! Detail rows are expensive to rebuild, so when one is evicted after a
//! model update its controller can be parked here instead of destroyed.

use std::num::NonZeroUsize;

use lru::LruCache;

use super::row_ctrl::RowCtrl;
use crate::model::{NodeId, RowId};

/// Capacity used when none is configured.
pub const DEFAULT_DETAIL_CACHE_CAPACITY: usize = 10;

/// Capacity used when the configured count is zero.
pub const FALLBACK_DETAIL_CACHE_CAPACITY: usize = 3;

/// Result of a cache lookup.
#[derive(Debug)]
pub enum CacheLookup {
    /// Cached controller for the same node object.
    Hit(RowCtrl),
    /// A controller was cached under the row id but belongs to a previous
    /// node object (the data was reloaded). It must be destroyed.
    Stale(RowCtrl),
    /// Nothing cached under the row id.
    Miss,
}

/// LRU of detail row controllers keyed by row id.
///
/// Entries are only ever removed by lookup, so eviction order is the order
/// in which entries were added.
#[derive(Debug)]
pub struct DetailRowCache {
    entries: LruCache<RowId, RowCtrl>,
}

impl DetailRowCache {
    /// Create a cache holding at most `capacity` controllers. Zero means
    /// [`FALLBACK_DETAIL_CACHE_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(FALLBACK_DETAIL_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Number of cached controllers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached controllers.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Park a controller. Returns the controller pushed out by overflow (or
    /// replaced under the same id), which the caller must destroy.
    pub fn add_row(&mut self, mut ctrl: RowCtrl) -> Option<RowCtrl> {
        let Some(row_id) = ctrl.row_id().cloned() else {
            return Some(ctrl);
        };
        ctrl.set_cached(true);
        self.entries.push(row_id, ctrl).map(|(_, mut evicted)| {
            evicted.set_cached(false);
            evicted
        })
    }

    /// Take the controller cached for `row_id`, if it was built for `node`.
    pub fn get_row(&mut self, node: NodeId, row_id: &RowId) -> CacheLookup {
        match self.entries.pop(row_id) {
            Some(mut ctrl) => {
                ctrl.set_cached(false);
                if ctrl.node() == node {
                    CacheLookup::Hit(ctrl)
                } else {
                    CacheLookup::Stale(ctrl)
                }
            }
            None => CacheLookup::Miss,
        }
    }

    /// Cached controllers, least recently added first.
    pub fn entries(&self) -> impl Iterator<Item = &RowCtrl> {
        self.entries.iter().rev().map(|(_, ctrl)| ctrl)
    }

    /// Remove every entry for destruction.
    pub fn drain(&mut self) -> Vec<RowCtrl> {
        let mut out = Vec::with_capacity(self.entries.len());
        while let Some((_, mut ctrl)) = self.entries.pop_lru() {
            ctrl.set_cached(false);
            out.push(ctrl);
        }
        out
    }
}
