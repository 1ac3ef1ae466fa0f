//! Row model abstraction consumed by the rendering pipeline.

use super::row_node::{NodeId, RowNode, RowNodeTable};

/// Which row model implementation is active.
///
/// Chosen once at construction. Only the client-side and server-side models
/// support sticky group rows and lazy row heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowModelKind {
    /// All rows held in memory.
    ClientSide,
    /// Rows loaded per group store from a datasource.
    ServerSide,
    /// Flat rows loaded in blocks while scrolling.
    Infinite,
}

/// Capability interface every row model provides to the renderer.
///
/// Display indices are dense: rows `0..row_count()` are all addressable via
/// [`row_at`](Self::row_at) unless the model is still loading them.
pub trait RowModel {
    /// Implementation kind.
    fn kind(&self) -> RowModelKind;

    /// Node table backing this model.
    fn nodes(&self) -> &RowNodeTable;

    /// Mutable node table. The renderer only writes transient flags
    /// (`sticky`, `sticky_row_top`, `already_rendered`).
    fn nodes_mut(&mut self) -> &mut RowNodeTable;

    /// Node displayed at `index`.
    fn row_at(&self, index: usize) -> Option<NodeId>;

    /// Number of displayed rows.
    fn row_count(&self) -> usize;

    /// Display index of the row covering `pixel`.
    ///
    /// Pixels above the first row map to the first row and pixels below the
    /// last row map to the last row. `None` only when the model is empty.
    fn row_index_at_pixel(&self, pixel: i64) -> Option<usize>;

    /// Whether anything can be rendered at all.
    fn is_rows_to_render(&self) -> bool {
        self.row_count() > 0
    }

    /// Whether `node` is still part of the displayed rows.
    fn is_row_present(&self, node: NodeId) -> bool {
        self.nodes().get(node).is_some_and(RowNode::is_displayed)
    }

    /// Resolve estimated heights of rows intersecting the pixel band.
    ///
    /// Returns `true` when any height changed, which invalidates every row
    /// top below the first changed row.
    fn ensure_row_heights_valid(&mut self, _start_pixel: i64, _end_pixel: i64) -> bool {
        false
    }

    /// Whether sticky group rows can be computed for this model.
    fn supports_sticky_rows(&self) -> bool {
        matches!(self.kind(), RowModelKind::ClientSide | RowModelKind::ServerSide)
    }

    /// Bottom pixel of the last visible descendant of `node`.
    ///
    /// `None` when the model cannot tell, in which case a sticky row is
    /// pinned without an upward shift.
    fn last_descendant_bottom(&self, node: NodeId) -> Option<i64>;

    /// Convenience lookup.
    fn node(&self, id: NodeId) -> Option<&RowNode> {
        self.nodes().get(id)
    }
}
