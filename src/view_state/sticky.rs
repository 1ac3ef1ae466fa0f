//! Sticky group rows.
//!
//! While scrolling through a grouped or tree-shaped model, the ancestors of
//! the first visible row are pinned at the top of the body. A group whose
//! last descendant is about to scroll out is pushed up so it leaves together
//! with its children.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::model::{NodeId, RowModel};

/// Rows that should be pinned, with their offsets within the sticky band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyPlan {
    /// Pinned rows in pin order, each with its `sticky_row_top`.
    pub rows: Vec<(NodeId, i64)>,
    /// Height of the sticky band.
    pub height: i64,
}

impl StickyPlan {
    /// Whether `node` is pinned by this plan.
    pub fn contains(&self, node: NodeId) -> bool {
        self.rows.iter().any(|(id, _)| *id == node)
    }

    /// Whether nothing is pinned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn pin<M: RowModel + ?Sized>(&mut self, model: &M, node: NodeId, first_pixel: i64) {
        let Some(row_height) = model.node(node).map(|n| n.row_height) else {
            return;
        };

        let stick_row_bottom = first_pixel.saturating_add(self.height).saturating_add(row_height);
        let top = match model.last_descendant_bottom(node) {
            Some(last_child_bottom) if last_child_bottom < stick_row_bottom => {
                self.height + (last_child_bottom - stick_row_bottom)
            }
            _ => self.height,
        };
        self.rows.push((node, top));

        self.height = self
            .rows
            .iter()
            .filter_map(|(id, top)| model.node(*id).map(|n| top + n.row_height))
            .fold(0, i64::max);
    }
}

/// Work out which rows to pin for a body whose first visible pixel is
/// `first_pixel`.
///
/// Repeatedly looks at the row just below the current band. If one of its
/// ancestors is displayed but not yet pinned, the outermost such ancestor is
/// pinned. Otherwise the row itself is pinned when it is an expanded group
/// that has started to scroll under the band. Stops at the first row that
/// needs neither.
pub fn check_sticky_rows<M: RowModel + ?Sized>(model: &M, first_pixel: i64) -> StickyPlan {
    let mut plan = StickyPlan::default();

    loop {
        let first_pixel_after_sticky = first_pixel.saturating_add(plan.height);
        let Some(id) = model
            .row_index_at_pixel(first_pixel_after_sticky)
            .and_then(|index| model.row_at(index))
        else {
            break;
        };
        let Some(row) = model.node(id) else {
            break;
        };
        if row.level < 0 {
            break;
        }

        let mut ancestors = model.nodes().ancestors(id);
        ancestors.reverse();
        let missing_parent = ancestors.into_iter().find(|parent| {
            !plan.contains(*parent) && model.node(*parent).is_some_and(|p| p.is_displayed())
        });
        if let Some(parent) = missing_parent {
            plan.pin(model, parent, first_pixel);
            continue;
        }

        let expandable = row.group || row.expandable;
        let started_scrolling = row
            .row_top
            .is_some_and(|top| top < first_pixel_after_sticky);
        if expandable && row.expanded && started_scrolling && !plan.contains(id) {
            plan.pin(model, id, first_pixel);
            continue;
        }

        break;
    }

    plan
}

/// Changes applied by [`StickyRowEngine::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyUpdate {
    /// Pinned rows sorted by display index, descending.
    pub rows: Vec<NodeId>,
    /// Rows no longer pinned. Their controllers must be destroyed.
    pub removed: Vec<NodeId>,
    /// Rows newly pinned. They need controllers.
    pub added: Vec<NodeId>,
    /// Height of the sticky band.
    pub height: i64,
    /// Whether `height` differs from the previous refresh.
    pub height_changed: bool,
}

/// Tracks the pinned set across refreshes and keeps node flags in sync.
#[derive(Debug, Clone, Default)]
pub struct StickyRowEngine {
    group_rows_sticky: bool,
    unsupported_warned: bool,
    pinned: Vec<NodeId>,
    height: i64,
}

impl StickyRowEngine {
    /// Engine with nothing pinned.
    pub fn new(group_rows_sticky: bool) -> Self {
        Self {
            group_rows_sticky,
            ..Self::default()
        }
    }

    /// Whether sticky rows are computed for `model`. Warns once when the
    /// option is on but the row model cannot support it.
    pub fn is_enabled<M: RowModel + ?Sized>(&mut self, model: &M) -> bool {
        if !self.group_rows_sticky {
            return false;
        }
        if model.supports_sticky_rows() {
            return true;
        }
        if !self.unsupported_warned {
            warn!(
                kind = ?model.kind(),
                "groupRowsSticky is only supported by the client-side and server-side row models"
            );
            self.unsupported_warned = true;
        }
        false
    }

    /// Currently pinned rows.
    pub fn pinned(&self) -> &[NodeId] {
        &self.pinned
    }

    /// Height of the sticky band.
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Recompute the pinned set and update `sticky` / `sticky_row_top` on
    /// the affected nodes.
    pub fn refresh<M: RowModel + ?Sized>(&mut self, model: &mut M, first_pixel: i64) -> StickyUpdate {
        let plan = if self.is_enabled(&*model) {
            check_sticky_rows(&*model, first_pixel)
        } else {
            StickyPlan::default()
        };
        self.apply(model, plan)
    }

    /// Unpin everything.
    pub fn clear<M: RowModel + ?Sized>(&mut self, model: &mut M) -> StickyUpdate {
        self.apply(model, StickyPlan::default())
    }

    fn apply<M: RowModel + ?Sized>(&mut self, model: &mut M, plan: StickyPlan) -> StickyUpdate {
        let next: HashSet<NodeId> = plan.rows.iter().map(|(id, _)| *id).collect();
        let previous: HashSet<NodeId> = self.pinned.iter().copied().collect();

        let removed: Vec<NodeId> = self
            .pinned
            .iter()
            .copied()
            .filter(|id| !next.contains(id))
            .collect();
        let added: Vec<NodeId> = plan
            .rows
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !previous.contains(id))
            .collect();

        let nodes = model.nodes_mut();
        for id in &removed {
            if let Some(node) = nodes.get_mut(*id) {
                node.sticky = false;
                node.sticky_row_top = None;
            }
        }
        for (id, top) in &plan.rows {
            if let Some(node) = nodes.get_mut(*id) {
                node.sticky = true;
                node.sticky_row_top = Some(*top);
            }
        }

        let mut rows: Vec<NodeId> = plan.rows.iter().map(|(id, _)| *id).collect();
        rows.sort_by_key(|id| std::cmp::Reverse(model.node(*id).and_then(|n| n.row_index)));

        let height_changed = plan.height != self.height;
        if !removed.is_empty() || !added.is_empty() || height_changed {
            debug!(
                pinned = rows.len(),
                height = plan.height,
                "sticky rows changed"
            );
        }

        self.pinned = rows.clone();
        self.height = plan.height;

        StickyUpdate {
            rows,
            removed,
            added,
            height: plan.height,
            height_changed,
        }
    }
}
