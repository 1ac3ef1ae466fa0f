//! Notifications the renderer hands back to its host.

use super::focus::FocusedCell;

/// Something the host may need to react to after a redraw.
///
/// Collected in order and drained with
/// [`RowRenderer::take_events`](super::RowRenderer::take_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// The rendered index window moved.
    ViewportChanged {
        /// First rendered display index.
        first: i64,
        /// Last rendered display index.
        last: i64,
    },
    /// The set of displayed row controllers changed.
    DisplayedRowsChanged {
        /// Caused by a scroll rather than a model update.
        after_scroll: bool,
    },
    /// Total height of the sticky band changed.
    StickyHeightChanged {
        /// New band height in pixels.
        height: i64,
    },
    /// Scrollable body height changed.
    BodyHeightChanged {
        /// New body height in pixels.
        height: i64,
    },
    /// Number of displayed rows changed.
    RowCountChanged {
        /// Displayed row count.
        count: usize,
    },
    /// Vertical scroll was reset because new data arrived.
    ScrolledToTop,
    /// Focus was moved back onto a rebuilt row.
    FocusRestored {
        /// Cell that regained focus.
        cell: FocusedCell,
    },
}
