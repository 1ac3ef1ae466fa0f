//! Redraw orchestration.
//!
//! [`RowRenderer`] turns model updates and scroll events into row
//! controllers. Every entry point funnels into the same core redraw:
//! compute the index window, refresh sticky rows, work out which indices to
//! draw, then remove, create and evict controllers through the
//! [`RowLifecycleCache`].

use std::collections::{BTreeSet, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::components::RowComponentFactory;
use super::debounce::Debouncer;
use super::events::RenderEvent;
use super::focus::{FocusState, FocusTarget, FocusedCell};
use super::guard::RedrawGuard;
use super::lifecycle::{BuildMode, Hooks, RecycledRows, RowLifecycleCache};
use super::row_ctrl::{RowContainer, RowCtrl, RowCtrlId};
use super::task_queue::{DeferredTask, FrameTask, TaskQueue};
use crate::config::{DomLayout, GridOptions};
use crate::model::{NodeId, Pagination, RowModel, RowPinned};
use crate::view_state::{StickyRowEngine, StickyUpdate, ViewportInput, ViewportRangeCalculator};

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;

macro_rules! hooks {
    ($renderer:ident) => {
        Hooks {
            components: $renderer.components.as_mut(),
            focus: &mut $renderer.focus,
        }
    };
}

/// Flags describing why a full redraw was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelUpdate {
    /// Keep controllers of rows that are still displayed.
    pub recycle_rows: bool,
    /// Animate rows out (only honored when `animate_rows` is on).
    pub animate: bool,
    /// New data was loaded; scrolls to the top.
    pub new_data: bool,
    /// The page changed; scrolls to the top.
    pub new_page: bool,
    /// Leave pinned top/bottom rows alone.
    pub only_body: bool,
    /// Switched to or from print layout; disables recycling.
    pub dom_layout_changed: bool,
    /// Do not restore the focused cell afterwards.
    pub suppress_keep_focus: bool,
}

impl ModelUpdate {
    /// Update that keeps every controller it can.
    pub fn recycle() -> Self {
        Self {
            recycle_rows: true,
            ..Self::default()
        }
    }
}

/// Snapshot used to report "displayed rows changed" only on real changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DisplayedRows {
    body: Vec<(usize, RowCtrlId)>,
    zombies: Vec<RowCtrlId>,
    sticky: Vec<RowCtrlId>,
    pinned: Vec<NodeId>,
}

/// Row renderer for one grid body.
///
/// Owns the row model and every row controller. The host feeds it scroll
/// positions, model updates and clock ticks, drains the frame and deferred
/// task queues, and reads back [`RenderEvent`]s.
pub struct RowRenderer<M: RowModel> {
    model: M,
    options: GridOptions,
    pagination: Pagination,
    components: Box<dyn RowComponentFactory>,
    viewport: ViewportRangeCalculator,
    input: ViewportInput,
    sticky: StickyRowEngine,
    sticky_ctrls: Vec<RowCtrl>,
    lifecycle: RowLifecycleCache,
    pinned_top_nodes: Vec<NodeId>,
    pinned_bottom_nodes: Vec<NodeId>,
    pinned_top: Vec<RowCtrl>,
    pinned_bottom: Vec<RowCtrl>,
    /// Nodes whose pinned display position was set by the last refresh.
    floating_placed: Vec<NodeId>,
    pinning: (bool, bool),
    guard: RedrawGuard,
    focus: FocusState,
    events: Vec<RenderEvent>,
    frames: TaskQueue<FrameTask>,
    deferred: TaskQueue<DeferredTask>,
    height_debounce: Debouncer,
    body_height: i64,
    row_count: usize,
    displayed: DisplayedRows,
    destroyed: bool,
}

impl<M: RowModel> std::fmt::Debug for RowRenderer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowRenderer")
            .field("window", &self.viewport.window())
            .field("live", &self.lifecycle.live_len())
            .field("sticky", &self.sticky_ctrls.len())
            .field("zombies", &self.lifecycle.zombie_count())
            .finish()
    }
}

impl<M: RowModel> RowRenderer<M> {
    /// Create a renderer over `model`. Nothing is rendered until the first
    /// redraw.
    pub fn new(model: M, options: GridOptions, components: impl RowComponentFactory + 'static) -> Self {
        Self {
            model,
            pagination: Pagination::new(options.pagination_page_size),
            components: Box::new(components),
            viewport: ViewportRangeCalculator::new(&options),
            input: ViewportInput::default(),
            sticky: StickyRowEngine::new(options.group_rows_sticky),
            sticky_ctrls: Vec::new(),
            lifecycle: RowLifecycleCache::from_options(&options),
            pinned_top_nodes: Vec::new(),
            pinned_bottom_nodes: Vec::new(),
            pinned_top: Vec::new(),
            pinned_bottom: Vec::new(),
            floating_placed: Vec::new(),
            pinning: (false, false),
            guard: RedrawGuard::new(),
            focus: FocusState::default(),
            events: Vec::new(),
            frames: TaskQueue::new(),
            deferred: TaskQueue::new(),
            height_debounce: Debouncer::new(Duration::from_millis(options.height_debounce_ms)),
            body_height: 0,
            row_count: 0,
            displayed: DisplayedRows::default(),
            destroyed: false,
            options,
        }
    }

    /// Share `guard` with code that needs to observe redraws in progress.
    pub fn with_redraw_guard(mut self, guard: RedrawGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Set the initial viewport height without redrawing.
    pub fn with_viewport_height(mut self, viewport_height: i64) -> Self {
        self.input.viewport_height = viewport_height.max(0);
        self
    }

    /// Shared re-entrancy flag, for component factories that need to check it.
    pub fn redraw_guard(&self) -> RedrawGuard {
        self.guard.clone()
    }

    /// The row model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable model access. Follow structural changes with
    /// [`redraw_after_model_update`](Self::redraw_after_model_update).
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Options the renderer was built with.
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Current pagination state.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Last scroll position and viewport height.
    pub fn viewport_input(&self) -> ViewportInput {
        self.input
    }

    /// Current scrollable body height in pixels.
    pub fn body_height(&self) -> i64 {
        self.body_height
    }

    /// Height of the sticky band in pixels.
    pub fn sticky_height(&self) -> i64 {
        self.sticky.height()
    }

    // ===== Entry points =====

    /// Full redraw after the row model changed.
    ///
    /// # Panics
    ///
    /// Panics if called while a redraw is already running.
    pub fn redraw_after_model_update(&mut self, update: ModelUpdate) {
        if self.destroyed {
            return;
        }
        let _lock = self.guard.enter();
        self.model_update_locked(update);
    }

    /// Redraw after a vertical scroll or viewport resize.
    ///
    /// # Panics
    ///
    /// Panics if called while a redraw is already running.
    pub fn redraw_after_scroll(&mut self) {
        if self.destroyed {
            return;
        }
        let _lock = self.guard.enter();
        self.scroll_locked();
    }

    /// Scroll the body to `scroll_top` and redraw.
    pub fn on_body_scroll(&mut self, scroll_top: i64) {
        self.input.scroll_top = scroll_top.max(0);
        self.redraw_after_scroll();
    }

    /// Resize the viewport and redraw.
    pub fn set_viewport_height(&mut self, viewport_height: i64) {
        self.input.viewport_height = viewport_height.max(0);
        self.redraw_after_scroll();
    }

    /// Redraw the given rows from scratch, or every row when `nodes` is
    /// `None`.
    pub fn redraw_rows(&mut self, nodes: Option<&[NodeId]>) {
        if self.destroyed {
            return;
        }
        let _lock = self.guard.enter();
        match nodes {
            Some(nodes) => {
                let targets: HashSet<NodeId> = nodes.iter().copied().collect();
                let indices: Vec<usize> = self
                    .lifecycle
                    .live_ctrls()
                    .filter(|(_, ctrl)| targets.contains(&ctrl.node()))
                    .map(|(index, _)| index)
                    .collect();
                self.lifecycle.destroy_live(&indices, &mut hooks!(self));
                self.rebuild_sticky_ctrls(&targets);
                self.model_update_locked(ModelUpdate::recycle());
            }
            None => self.model_update_locked(ModelUpdate::default()),
        }
    }

    /// Column pinning changed. Full-width rows span the pinned sections, so
    /// they are rebuilt when either side toggles.
    pub fn on_displayed_columns_changed(&mut self, pinning_left: bool, pinning_right: bool) {
        if self.destroyed || self.pinning == (pinning_left, pinning_right) {
            return;
        }
        self.pinning = (pinning_left, pinning_right);
        let _lock = self.guard.enter();
        let full_width: Vec<usize> = self
            .lifecycle
            .live_ctrls()
            .filter(|(_, ctrl)| ctrl.is_full_width())
            .map(|(index, _)| index)
            .collect();
        self.refresh_floating_rows();
        self.lifecycle.destroy_live(&full_width, &mut hooks!(self));
        self.scroll_locked();
    }

    /// Switch DOM layout. Moving into or out of print layout redraws every
    /// row without recycling.
    pub fn set_dom_layout(&mut self, dom_layout: DomLayout) {
        let was_print = self.options.is_print_layout();
        self.options.dom_layout = dom_layout;
        self.viewport.set_dom_layout(dom_layout);
        if was_print != self.options.is_print_layout() {
            self.redraw_after_model_update(ModelUpdate {
                dom_layout_changed: true,
                ..ModelUpdate::default()
            });
        }
    }

    /// Go to `page`. Returns whether the page changed.
    pub fn on_pagination_changed(&mut self, page: usize) -> bool {
        if !self.pagination.set_page(page, &self.model) {
            return false;
        }
        self.redraw_after_model_update(ModelUpdate {
            new_page: true,
            only_body: true,
            ..ModelUpdate::default()
        });
        true
    }

    /// Show `nodes` in the top floating section and redraw.
    pub fn set_pinned_top_rows(&mut self, nodes: Vec<NodeId>) {
        self.pinned_top_nodes = nodes;
        self.redraw_after_model_update(ModelUpdate::recycle());
    }

    /// Show `nodes` in the bottom floating section and redraw.
    pub fn set_pinned_bottom_rows(&mut self, nodes: Vec<NodeId>) {
        self.pinned_bottom_nodes = nodes;
        self.redraw_after_model_update(ModelUpdate::recycle());
    }

    // ===== Row height debounce =====

    /// A row changed height at `now`. Layout is recomputed once the burst
    /// settles; see [`tick`](Self::tick).
    pub fn on_row_height_changed(&mut self, now: Instant) {
        if !self.destroyed {
            self.height_debounce.trigger(now);
        }
    }

    /// Advance the clock. Returns `true` when a debounced height redraw ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.height_debounce.poll(now) {
            return false;
        }
        self.redraw_after_model_update(ModelUpdate {
            recycle_rows: true,
            only_body: true,
            ..ModelUpdate::default()
        });
        true
    }

    // ===== Editing and focus =====

    /// Start editing the body row at `index`. Returns `false` when no live
    /// controller renders that row.
    pub fn start_editing(&mut self, index: usize) -> bool {
        match self.lifecycle.live_mut(index) {
            Some(ctrl) => {
                ctrl.set_editing(true);
                true
            }
            None => false,
        }
    }

    /// Commit or cancel the edit on the body row at `index`.
    pub fn stop_editing(&mut self, index: usize) {
        if let Some(ctrl) = self.lifecycle.live_mut(index) {
            ctrl.set_editing(false);
        }
    }

    /// Focus `cell`, or clear focus with `None`. Input focus moves to the
    /// controller rendering the cell if there is one.
    pub fn set_focused_cell(&mut self, cell: Option<FocusedCell>) {
        let target = cell
            .as_ref()
            .and_then(|cell| self.ctrl_for_cell(cell))
            .map_or(FocusTarget::Outside, focus_target_for);
        self.focus.set(cell, target);
    }

    /// Report where input focus actually is, e.g. an editor or outside the
    /// grid.
    pub fn set_focus_target(&mut self, target: FocusTarget) {
        self.focus.set_target(target);
    }

    /// Logically focused cell.
    pub fn focused_cell(&self) -> Option<&FocusedCell> {
        self.focus.cell()
    }

    /// Element holding input focus.
    pub fn focus_target(&self) -> FocusTarget {
        self.focus.target()
    }

    // ===== Task queues =====

    /// Run queued animation-frame work. Returns the number of tasks run.
    pub fn flush_animation_frames(&mut self) -> usize {
        let tasks = self.frames.drain();
        let count = tasks.len();
        for task in tasks {
            match task {
                FrameTask::BuildRow(id) => {
                    let Some(ctrl) = self.lifecycle.find_live_mut(id) else {
                        continue;
                    };
                    if ctrl.is_built() || !ctrl.is_alive() {
                        continue;
                    }
                    if let Some(node) = self.model.node(ctrl.node()) {
                        self.components.create_row(ctrl, node);
                        ctrl.mark_built();
                    }
                }
            }
        }
        count
    }

    /// Number of queued animation-frame tasks.
    pub fn pending_frame_tasks(&self) -> usize {
        self.frames.len()
    }

    /// Finish deferred teardown of animated-out rows. Returns the number of
    /// batches drained.
    pub fn run_deferred(&mut self) -> usize {
        let tasks = self.deferred.drain();
        let count = tasks.len();
        for task in tasks {
            match task {
                DeferredTask::FinishDestroy(ids) => {
                    let finished = self.lifecycle.finish_destroy(&ids, &mut hooks!(self));
                    trace!(finished, "deferred batch drained");
                }
            }
        }
        if count > 0 {
            self.dispatch_displayed_rows_changed(false);
        }
        count
    }

    /// Number of queued teardown batches.
    pub fn pending_deferred_batches(&self) -> usize {
        self.deferred.len()
    }

    /// Drain notifications collected since the last call.
    pub fn take_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Queries =====

    /// Body controllers: live rows in display order, then zombies still
    /// animating out, then detail rows parked in the cache.
    pub fn get_row_ctrls(&self) -> Vec<&RowCtrl> {
        let cached = self.lifecycle.detail_cache().into_iter().flat_map(|c| c.entries());
        self.lifecycle
            .live_ctrls()
            .map(|(_, ctrl)| ctrl)
            .chain(self.lifecycle.zombies())
            .chain(cached)
            .collect()
    }

    /// Live body controller at display index `index`.
    pub fn row_ctrl(&self, index: usize) -> Option<&RowCtrl> {
        self.lifecycle.live(index)
    }

    /// Body controllers and their lifecycle state.
    pub fn lifecycle(&self) -> &RowLifecycleCache {
        &self.lifecycle
    }

    /// Sticky controllers, highest display index first.
    pub fn sticky_ctrls(&self) -> &[RowCtrl] {
        &self.sticky_ctrls
    }

    /// Top floating controllers.
    pub fn pinned_top_ctrls(&self) -> &[RowCtrl] {
        &self.pinned_top
    }

    /// Bottom floating controllers.
    pub fn pinned_bottom_ctrls(&self) -> &[RowCtrl] {
        &self.pinned_bottom
    }

    /// First display index in the rendered window.
    pub fn first_rendered_index(&self) -> i64 {
        self.viewport.window().first
    }

    /// Last display index in the rendered window, `-1` when empty.
    pub fn last_rendered_index(&self) -> i64 {
        self.viewport.window().last
    }

    /// Whether any part of `start..=end` lies in the rendered window.
    pub fn is_range_in_rendered_viewport(&self, start: i64, end: i64) -> bool {
        let window = self.viewport.window();
        !window.is_empty() && start <= window.last && end >= window.first
    }

    /// Tear down every controller and stop the height debounce.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.height_debounce.cancel();
        self.frames.clear();
        self.deferred.clear();

        let mut hooks = hooks!(self);
        self.lifecycle.destroy_everything(&mut hooks);
        for mut ctrl in self
            .sticky_ctrls
            .drain(..)
            .chain(self.pinned_top.drain(..))
            .chain(self.pinned_bottom.drain(..))
        {
            hooks.destroy(&mut ctrl);
        }
        self.release_floating_nodes();
        self.sticky.clear(&mut self.model);
        debug!("row renderer destroyed");
    }

    /// Whether [`destroy`](Self::destroy) ran.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ===== Redraw sequence =====

    fn model_update_locked(&mut self, update: ModelUpdate) {
        let focused = if update.suppress_keep_focus {
            None
        } else {
            self.focus.cell_to_restore()
        };

        self.update_container_height();
        self.scroll_to_top_if_new_data(&update);

        let print = self.options.is_print_layout();
        let recycle = update.recycle_rows && !update.dom_layout_changed;
        let animate = update.animate && self.options.animate_rows && !print;

        let recycled = if recycle {
            Some(self.lifecycle.recycle(&self.model, &mut hooks!(self)))
        } else {
            self.lifecycle.destroy_all_live(&mut hooks!(self));
            let update = self.sticky.clear(&mut self.model);
            self.apply_sticky_update(&update);
            None
        };

        self.redraw_body(recycled, animate, false);
        self.update_row_count();
        if !update.only_body {
            self.refresh_floating_rows();
        }
        self.dispatch_displayed_rows_changed(false);

        if let Some(cell) = focused {
            self.restore_focused_cell(cell);
        }
    }

    fn scroll_locked(&mut self) {
        let focused = if self.options.prevent_scroll_focus_supported && self.sticky.is_enabled(&self.model) {
            self.focus.cell_to_restore()
        } else {
            None
        };

        let sticky_changed = self.redraw_body(None, false, true);
        self.dispatch_displayed_rows_changed(!sticky_changed);

        if let Some(cell) = focused {
            if self.focus.cell_to_restore().is_none() {
                self.flush_animation_frames();
                self.restore_focused_cell(cell);
            }
        }
    }

    /// Core redraw. Returns whether the sticky set changed.
    fn redraw_body(&mut self, mut recycled: Option<RecycledRows>, animate: bool, after_scroll: bool) -> bool {
        let range = self.viewport.compute(&mut self.model, &self.pagination, self.input);
        if range.changed {
            self.events.push(RenderEvent::ViewportChanged {
                first: range.window.first,
                last: range.window.last,
            });
        }
        if range.heights_changed {
            self.update_container_height();
        }

        let sticky_update = self.sticky.refresh(&mut self.model, range.first_visible_pixel);
        let sticky_changed = !sticky_update.added.is_empty() || !sticky_update.removed.is_empty();
        self.apply_sticky_update(&sticky_update);

        let to_draw = self.indexes_to_draw(range.window.indices(), recycled.as_ref());
        let pixel_offset = range.page.pixel_offset;
        let print = self.options.is_print_layout();
        let build = if after_scroll && !self.options.suppress_animation_frame && !print {
            BuildMode::NextFrame
        } else {
            BuildMode::Now
        };

        // Build first and commit after, so a panicking component leaves the
        // live map as it was.
        let mut pending = Vec::new();
        {
            let mut hooks = hooks!(self);
            for &index in &to_draw {
                if self.lifecycle.live(index).is_some() {
                    continue;
                }
                if let Some(ctrl) = self.lifecycle.create_or_reuse(
                    &mut self.model,
                    index,
                    recycled.as_mut(),
                    build,
                    pixel_offset,
                    &mut hooks,
                ) {
                    pending.push((index, ctrl));
                }
            }
        }

        let stale: Vec<usize> = self
            .lifecycle
            .live_indices()
            .into_iter()
            .filter(|index| !to_draw.contains(index))
            .collect();
        self.lifecycle.destroy_live(&stale, &mut hooks!(self));

        for (index, ctrl) in pending {
            if !ctrl.is_built() {
                self.frames.push(FrameTask::BuildRow(ctrl.id()));
            }
            self.lifecycle.insert_live(index, ctrl);
        }
        for (_, ctrl) in self.lifecycle.live_ctrls_mut() {
            if let Some(node) = self.model.node(ctrl.node()) {
                ctrl.sync_geometry(node, pixel_offset);
            }
        }

        if let Some(recycled) = recycled {
            let animate = animate && !after_scroll && !print;
            if let Some(task) = self.lifecycle.evict_recycled(recycled, animate, &mut hooks!(self)) {
                self.deferred.push(task);
            }
        }
        sticky_changed
    }

    /// Window indices plus retained rows, minus rows currently pinned as
    /// sticky. Indices without a node are skipped.
    fn indexes_to_draw(&self, window: impl Iterator<Item = usize>, recycled: Option<&RecycledRows>) -> BTreeSet<usize> {
        let mut indexes: BTreeSet<usize> = window.collect();
        let first = self.viewport.window().first;
        let last = self.viewport.window().last;

        let live = self.lifecycle.live_ctrls().map(|(_, ctrl)| ctrl);
        let recycled = recycled.into_iter().flat_map(RecycledRows::ctrls);
        for ctrl in live.chain(recycled) {
            let Some(index) = self.model.node(ctrl.node()).and_then(|n| n.row_index) else {
                continue;
            };
            let outside = (index as i64) < first || (index as i64) > last;
            if outside && self.keep_outside_window(ctrl) {
                indexes.insert(index);
            }
        }

        indexes.retain(|&index| {
            self.model
                .row_at(index)
                .and_then(|id| self.model.node(id))
                .is_some_and(|node| !node.sticky)
        });
        indexes
    }

    /// Retention for rows scrolled out of the window: focused rows, rows
    /// being edited and detail rows of expanded masters stay, as long as
    /// they are still on the current page.
    fn keep_outside_window(&self, ctrl: &RowCtrl) -> bool {
        let Some(node) = self.model.node(ctrl.node()) else {
            return false;
        };
        let focused = match (self.focus.cell(), node.row_index) {
            (Some(cell), Some(index)) => cell.is_on_row(index, node.pinned),
            _ => false,
        };
        let open_detail = node.detail
            && node
                .parent
                .and_then(|master| self.model.node(master))
                .is_some_and(|master| master.master && master.expanded);

        if !(focused || ctrl.is_editing() || open_detail) {
            return false;
        }
        self.model.is_row_present(ctrl.node()) && self.pagination.is_row_in_page(&self.model, ctrl.node())
    }

    fn apply_sticky_update(&mut self, update: &StickyUpdate) {
        let mut hooks = hooks!(self);
        let removed: HashSet<NodeId> = update.removed.iter().copied().collect();
        let mut kept = Vec::with_capacity(update.rows.len());
        for mut ctrl in self.sticky_ctrls.drain(..) {
            if removed.contains(&ctrl.node()) {
                hooks.destroy(&mut ctrl);
            } else {
                kept.push(ctrl);
            }
        }

        for &node_id in &update.added {
            if let Some(node) = self.model.node(node_id) {
                let mut ctrl = RowCtrl::new(self.lifecycle.next_ctrl_id(), node_id, node, RowContainer::StickyTop);
                hooks.components.create_row(&ctrl, node);
                ctrl.mark_built();
                kept.push(ctrl);
            }
        }

        let mut ordered = Vec::with_capacity(kept.len());
        for node_id in &update.rows {
            if let Some(pos) = kept.iter().position(|c| c.node() == *node_id) {
                let mut ctrl = kept.swap_remove(pos);
                if let Some(node) = self.model.node(*node_id) {
                    ctrl.sync_geometry(node, 0);
                    ctrl.set_top(node.sticky_row_top.unwrap_or(0));
                }
                ordered.push(ctrl);
            }
        }
        for mut orphan in kept {
            hooks.destroy(&mut orphan);
        }
        self.sticky_ctrls = ordered;

        if update.height_changed {
            self.events.push(RenderEvent::StickyHeightChanged { height: update.height });
        }
    }

    /// Replace sticky controllers whose node is in `targets` with fresh ones.
    fn rebuild_sticky_ctrls(&mut self, targets: &HashSet<NodeId>) {
        let mut hooks = hooks!(self);
        for slot in &mut self.sticky_ctrls {
            if !targets.contains(&slot.node()) {
                continue;
            }
            let Some(node) = self.model.node(slot.node()) else {
                continue;
            };
            let mut fresh = RowCtrl::new(self.lifecycle.next_ctrl_id(), slot.node(), node, RowContainer::StickyTop);
            hooks.components.create_row(&fresh, node);
            fresh.mark_built();
            fresh.set_top(slot.top());
            let mut old = std::mem::replace(slot, fresh);
            hooks.destroy(&mut old);
        }
    }

    /// Destroy and rebuild the pinned top and bottom controllers.
    fn refresh_floating_rows(&mut self) {
        let mut hooks = hooks!(self);
        for mut ctrl in self.pinned_top.drain(..).chain(self.pinned_bottom.drain(..)) {
            hooks.destroy(&mut ctrl);
        }
        self.release_floating_nodes();

        let mut hooks = hooks!(self);
        let sections = [
            (&self.pinned_top_nodes, RowPinned::Top, RowContainer::PinnedTop, &mut self.pinned_top),
            (
                &self.pinned_bottom_nodes,
                RowPinned::Bottom,
                RowContainer::PinnedBottom,
                &mut self.pinned_bottom,
            ),
        ];
        for (nodes, pinned, container, ctrls) in sections {
            let mut top = 0;
            for (index, &node_id) in nodes.iter().enumerate() {
                let Some(node) = self.model.nodes_mut().get_mut(node_id) else {
                    continue;
                };
                node.pinned = Some(pinned);
                node.set_display(index, top);
                top += node.row_height;
                self.floating_placed.push(node_id);

                let mut ctrl = RowCtrl::new(self.lifecycle.next_ctrl_id(), node_id, node, container);
                hooks.components.create_row(&ctrl, node);
                ctrl.mark_built();
                ctrls.push(ctrl);
            }
        }
    }

    /// Undo the pinned display position of every node placed by the last
    /// floating refresh, so rows that left the pinned lists stop counting
    /// as displayed.
    fn release_floating_nodes(&mut self) {
        for node_id in self.floating_placed.drain(..) {
            if let Some(node) = self.model.nodes_mut().get_mut(node_id) {
                if node.pinned.is_some() {
                    node.pinned = None;
                    node.clear_display();
                }
            }
        }
    }

    fn update_container_height(&mut self) {
        let height = self.pagination.bounds(&self.model).height().max(1);
        if height != self.body_height {
            self.body_height = height;
            self.events.push(RenderEvent::BodyHeightChanged { height });
        }
    }

    fn scroll_to_top_if_new_data(&mut self, update: &ModelUpdate) {
        if (update.new_data || update.new_page) && !self.options.suppress_scroll_on_new_data {
            self.input.scroll_top = 0;
            self.events.push(RenderEvent::ScrolledToTop);
        }
    }

    fn update_row_count(&mut self) {
        let count = self.model.row_count();
        if count != self.row_count {
            self.row_count = count;
            self.events.push(RenderEvent::RowCountChanged { count });
        }
    }

    fn dispatch_displayed_rows_changed(&mut self, after_scroll: bool) {
        let current = DisplayedRows {
            body: self.lifecycle.live_ctrls().map(|(index, ctrl)| (index, ctrl.id())).collect(),
            zombies: self.lifecycle.zombies().map(RowCtrl::id).collect(),
            sticky: self.sticky_ctrls.iter().map(RowCtrl::id).collect(),
            pinned: self
                .pinned_top_nodes
                .iter()
                .chain(&self.pinned_bottom_nodes)
                .copied()
                .collect(),
        };
        if current != self.displayed {
            self.displayed = current;
            self.events.push(RenderEvent::DisplayedRowsChanged { after_scroll });
        }
    }

    fn ctrl_for_cell(&self, cell: &FocusedCell) -> Option<&RowCtrl> {
        let on_row = |ctrl: &&RowCtrl| ctrl.row_index() == Some(cell.row_index);
        match cell.row_pinned {
            Some(RowPinned::Top) => self.pinned_top.iter().find(on_row),
            Some(RowPinned::Bottom) => self.pinned_bottom.iter().find(on_row),
            None => self
                .sticky_ctrls
                .iter()
                .find(on_row)
                .or_else(|| self.lifecycle.live(cell.row_index)),
        }
    }

    /// Move input focus back onto the controller now rendering `cell`.
    fn restore_focused_cell(&mut self, cell: FocusedCell) {
        let target = self
            .ctrl_for_cell(&cell)
            .map_or(FocusTarget::Outside, focus_target_for);
        self.focus.set(Some(cell.clone()), target);
        self.components.on_focus_restored(&cell);
        self.events.push(RenderEvent::FocusRestored { cell });
    }
}

fn focus_target_for(ctrl: &RowCtrl) -> FocusTarget {
    if ctrl.is_full_width() {
        FocusTarget::Row(ctrl.id())
    } else {
        FocusTarget::Cell(ctrl.id())
    }
}
