//! Row controller lifecycle: live map, recycling, zombies and the detail
//! cache.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::components::RowComponentFactory;
use super::detail_cache::{CacheLookup, DetailRowCache};
use super::focus::FocusState;
use super::row_ctrl::{RowContainer, RowCtrl, RowCtrlId};
use super::task_queue::DeferredTask;
use crate::config::GridOptions;
use crate::model::{NodeId, RowId, RowModel};

/// Component factory and focus state, borrowed for the duration of a
/// create or destroy.
pub(crate) struct Hooks<'a> {
    pub components: &'a mut dyn RowComponentFactory,
    pub focus: &'a mut FocusState,
}

impl Hooks<'_> {
    /// Run both teardown passes on `ctrl` and notify the host.
    pub(crate) fn destroy(&mut self, ctrl: &mut RowCtrl) {
        ctrl.destroy_second_pass();
        self.focus.on_ctrl_destroyed(ctrl.id());
        self.components.destroy_row(ctrl);
    }
}

/// How a freshly created controller gets its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Build inside the current redraw.
    Now,
    /// Leave unbuilt; the caller queues a frame task.
    NextFrame,
}

/// Controllers lifted out of the live map before a model-update redraw,
/// keyed by row id so they can be matched against the new display order.
#[derive(Debug, Default)]
pub struct RecycledRows {
    by_id: HashMap<RowId, RowCtrl>,
}

impl RecycledRows {
    /// Number of controllers waiting to be matched.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether every controller was matched or evicted.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Recycled controller for `row_id`.
    pub fn get(&self, row_id: &RowId) -> Option<&RowCtrl> {
        self.by_id.get(row_id)
    }

    /// Recycled controllers in no particular order.
    pub fn ctrls(&self) -> impl Iterator<Item = &RowCtrl> {
        self.by_id.values()
    }

    fn take_for(&mut self, row_id: &RowId, node: NodeId) -> Option<RowCtrl> {
        match self.by_id.get(row_id) {
            Some(ctrl) if ctrl.node() == node => self.by_id.remove(row_id),
            _ => None,
        }
    }

    /// Leftovers in their previous display order.
    fn into_ordered(self) -> Vec<RowCtrl> {
        let mut ctrls: Vec<RowCtrl> = self.by_id.into_values().collect();
        ctrls.sort_by_key(|c| (c.row_index(), c.id()));
        ctrls
    }
}

/// Owns every body row controller that is not sticky or floating.
///
/// A controller lives in exactly one of: the live map (keyed by display
/// index), a [`RecycledRows`] set during a redraw, the zombie set (first
/// teardown pass done) or the detail cache.
#[derive(Debug, Default)]
pub struct RowLifecycleCache {
    live: BTreeMap<usize, RowCtrl>,
    zombies: BTreeMap<RowCtrlId, RowCtrl>,
    detail_cache: Option<DetailRowCache>,
    next_id: u64,
}

impl RowLifecycleCache {
    /// Empty cache, optionally backed by a detail side cache.
    pub fn new(detail_cache: Option<DetailRowCache>) -> Self {
        Self {
            detail_cache,
            ..Self::default()
        }
    }

    /// Empty cache with the detail side cache configured from `options`.
    pub fn from_options(options: &GridOptions) -> Self {
        let cache = options
            .keep_detail_rows
            .then(|| DetailRowCache::new(options.detail_cache_capacity()));
        Self::new(cache)
    }

    /// Allocate a controller id.
    pub fn next_ctrl_id(&mut self) -> RowCtrlId {
        self.next_id += 1;
        RowCtrlId::new(self.next_id)
    }

    /// Number of live controllers.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Live controller at display index `index`.
    pub fn live(&self, index: usize) -> Option<&RowCtrl> {
        self.live.get(&index)
    }

    /// Live controllers in display index order.
    pub fn live_ctrls(&self) -> impl Iterator<Item = (usize, &RowCtrl)> {
        self.live.iter().map(|(index, ctrl)| (*index, ctrl))
    }

    pub(crate) fn live_ctrls_mut(&mut self) -> impl Iterator<Item = (usize, &mut RowCtrl)> {
        self.live.iter_mut().map(|(index, ctrl)| (*index, ctrl))
    }

    /// Display indices of the live controllers, ascending.
    pub fn live_indices(&self) -> Vec<usize> {
        self.live.keys().copied().collect()
    }

    /// Live controller with id `id`.
    pub fn find_live(&self, id: RowCtrlId) -> Option<&RowCtrl> {
        self.live.values().find(|c| c.id() == id)
    }

    pub(crate) fn find_live_mut(&mut self, id: RowCtrlId) -> Option<&mut RowCtrl> {
        self.live.values_mut().find(|c| c.id() == id)
    }

    pub(crate) fn live_mut(&mut self, index: usize) -> Option<&mut RowCtrl> {
        self.live.get_mut(&index)
    }

    /// Controllers animating out.
    pub fn zombies(&self) -> impl Iterator<Item = &RowCtrl> {
        self.zombies.values()
    }

    /// Number of controllers animating out.
    pub fn zombie_count(&self) -> usize {
        self.zombies.len()
    }

    /// Detail side cache, when detail rows are kept.
    pub fn detail_cache(&self) -> Option<&DetailRowCache> {
        self.detail_cache.as_ref()
    }

    pub(crate) fn insert_live(&mut self, index: usize, ctrl: RowCtrl) {
        self.live.insert(index, ctrl);
    }

    /// Move every live controller into a recycle set keyed by row id.
    ///
    /// Stub rows and rows whose node is gone are destroyed immediately;
    /// they can never be matched again.
    pub(crate) fn recycle<M: RowModel + ?Sized>(&mut self, model: &M, hooks: &mut Hooks<'_>) -> RecycledRows {
        let mut recycled = RecycledRows::default();
        for (_, mut ctrl) in std::mem::take(&mut self.live) {
            let reusable = model.node(ctrl.node()).is_some_and(|n| !n.is_stub());
            match ctrl.row_id().cloned() {
                Some(row_id) if reusable => {
                    recycled.by_id.insert(row_id, ctrl);
                }
                _ => hooks.destroy(&mut ctrl),
            }
        }
        trace!(count = recycled.len(), "rows moved to recycle set");
        recycled
    }

    /// Destroy the live controllers at `indices`, skipping the exit
    /// animation.
    pub(crate) fn destroy_live(&mut self, indices: &[usize], hooks: &mut Hooks<'_>) {
        for index in indices {
            if let Some(mut ctrl) = self.live.remove(index) {
                hooks.destroy(&mut ctrl);
            }
        }
    }

    pub(crate) fn destroy_all_live(&mut self, hooks: &mut Hooks<'_>) {
        let indices = self.live_indices();
        self.destroy_live(&indices, hooks);
    }

    /// Produce the controller for the row at `index`: a recycled one if
    /// the node was rendered before, else one from the detail cache, else a
    /// new one. The caller commits it to the live map.
    pub(crate) fn create_or_reuse<M: RowModel + ?Sized>(
        &mut self,
        model: &mut M,
        index: usize,
        recycled: Option<&mut RecycledRows>,
        build: BuildMode,
        pixel_offset: i64,
        hooks: &mut Hooks<'_>,
    ) -> Option<RowCtrl> {
        let node_id = model.row_at(index)?;
        let (row_id, already_rendered) = {
            let node = model.node(node_id)?;
            (node.id.clone(), node.already_rendered)
        };

        let reused = match (&row_id, recycled) {
            (Some(row_id), Some(recycled)) if already_rendered => recycled.take_for(row_id, node_id),
            _ => None,
        };
        let cached = match (&reused, &row_id, self.detail_cache.as_mut()) {
            (None, Some(row_id), Some(cache)) => match cache.get_row(node_id, row_id) {
                CacheLookup::Hit(ctrl) => Some(ctrl),
                CacheLookup::Stale(mut ctrl) => {
                    hooks.destroy(&mut ctrl);
                    None
                }
                CacheLookup::Miss => None,
            },
            _ => None,
        };

        let mut ctrl = match reused.or(cached) {
            Some(ctrl) => ctrl,
            None => {
                let node = model.node(node_id)?;
                let mut ctrl = RowCtrl::new(self.next_ctrl_id(), node_id, node, RowContainer::Body);
                if build == BuildMode::Now {
                    hooks.components.create_row(&ctrl, node);
                    ctrl.mark_built();
                }
                trace!(index, ctrl = %ctrl.id(), "row ctrl created");
                ctrl
            }
        };

        let node = model.nodes_mut().get_mut(node_id)?;
        node.already_rendered = true;
        ctrl.sync_geometry(node, pixel_offset);
        Some(ctrl)
    }

    /// Dispose of recycled controllers that found no row.
    ///
    /// Detail rows go to the cache when one is configured. With `animate`
    /// the rest become zombies and the returned task finishes them later.
    pub(crate) fn evict_recycled(
        &mut self,
        recycled: RecycledRows,
        animate: bool,
        hooks: &mut Hooks<'_>,
    ) -> Option<DeferredTask> {
        let mut batch = Vec::new();
        for mut ctrl in recycled.into_ordered() {
            if ctrl.is_detail() {
                if let Some(cache) = self.detail_cache.as_mut() {
                    if let Some(mut evicted) = cache.add_row(ctrl) {
                        hooks.destroy(&mut evicted);
                    }
                    continue;
                }
            }
            if animate {
                ctrl.destroy_first_pass();
                hooks.focus.on_ctrl_destroyed(ctrl.id());
                batch.push(ctrl.id());
                self.zombies.insert(ctrl.id(), ctrl);
            } else {
                hooks.destroy(&mut ctrl);
            }
        }
        (!batch.is_empty()).then_some(DeferredTask::FinishDestroy(batch))
    }

    /// Second teardown pass for a zombie batch. Returns how many zombies
    /// were finished.
    pub(crate) fn finish_destroy(&mut self, ids: &[RowCtrlId], hooks: &mut Hooks<'_>) -> usize {
        let mut finished = 0;
        for id in ids {
            if let Some(mut ctrl) = self.zombies.remove(id) {
                hooks.destroy(&mut ctrl);
                finished += 1;
            }
        }
        finished
    }

    /// Tear down everything, cache included.
    pub(crate) fn destroy_everything(&mut self, hooks: &mut Hooks<'_>) {
        self.destroy_all_live(hooks);
        for (_, mut ctrl) in std::mem::take(&mut self.zombies) {
            hooks.destroy(&mut ctrl);
        }
        if let Some(cache) = self.detail_cache.as_mut() {
            for mut ctrl in cache.drain() {
                hooks.destroy(&mut ctrl);
            }
        }
    }
}
