//! Row controllers: the renderer's per-row runtime objects.

use std::fmt;

use crate::model::{NodeId, RowId, RowNode};

/// Unique controller instance id. Never reused within a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowCtrlId(u64);

impl RowCtrlId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowCtrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-ctrl-{}", self.0)
    }
}

/// Where a controller paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowContainer {
    /// Scrolling body.
    Body,
    /// Sticky band at the top of the body.
    StickyTop,
    /// Floating rows above the body.
    PinnedTop,
    /// Floating rows below the body.
    PinnedBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Alive,
    /// First teardown pass done; waiting for the second.
    Removing,
    Destroyed,
}

/// Runtime state of one rendered row.
///
/// A controller is held by exactly one of the live map, the recycle map,
/// the zombie set or the detail cache at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCtrl {
    id: RowCtrlId,
    node: NodeId,
    row_id: Option<RowId>,
    container: RowContainer,
    row_index: Option<usize>,
    top: i64,
    height: i64,
    full_width: bool,
    detail: bool,
    built: bool,
    cached: bool,
    editing: bool,
    lifecycle: Lifecycle,
}

impl RowCtrl {
    pub(crate) fn new(id: RowCtrlId, node_id: NodeId, node: &RowNode, container: RowContainer) -> Self {
        Self {
            id,
            node: node_id,
            row_id: node.id.clone(),
            container,
            row_index: node.row_index,
            top: node.row_top.unwrap_or(0),
            height: node.row_height,
            full_width: node.full_width,
            detail: node.detail,
            built: false,
            cached: false,
            editing: false,
            lifecycle: Lifecycle::Alive,
        }
    }

    /// Controller id, unique per renderer.
    pub fn id(&self) -> RowCtrlId {
        self.id
    }

    /// Node this controller renders.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Row id captured at creation. `None` for stub rows.
    pub fn row_id(&self) -> Option<&RowId> {
        self.row_id.as_ref()
    }

    /// Container the row is drawn in.
    pub fn container(&self) -> RowContainer {
        self.container
    }

    /// Display index the row was last positioned at.
    pub fn row_index(&self) -> Option<usize> {
        self.row_index
    }

    /// Top offset within the container, in pixels.
    pub fn top(&self) -> i64 {
        self.top
    }

    /// Row height in pixels.
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Row spans all columns.
    pub fn is_full_width(&self) -> bool {
        self.full_width
    }

    /// Detail rows may be kept in the side cache instead of destroyed.
    pub fn is_detail(&self) -> bool {
        self.detail
    }

    /// Whether the row's components exist. Rows created while scrolling are
    /// built on the next animation frame.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Whether the controller currently sits in the detail cache.
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    /// A cell of this row is being edited.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Not yet torn down.
    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// First teardown pass done, second still pending.
    pub fn is_zombie(&self) -> bool {
        self.lifecycle == Lifecycle::Removing
    }

    /// Both teardown passes done.
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    pub(crate) fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    pub(crate) fn set_cached(&mut self, cached: bool) {
        self.cached = cached;
    }

    pub(crate) fn mark_built(&mut self) {
        self.built = true;
    }

    pub(crate) fn set_top(&mut self, top: i64) {
        self.top = top;
    }

    /// Sync position and size from the node.
    pub(crate) fn sync_geometry(&mut self, node: &RowNode, pixel_offset: i64) {
        self.row_index = node.row_index;
        self.top = node.row_top.unwrap_or(0) - pixel_offset;
        self.height = node.row_height;
        self.full_width = node.full_width;
    }

    /// Detach from the container. Editing stops; the row may still be
    /// painted while an exit animation runs.
    pub(crate) fn destroy_first_pass(&mut self) {
        if self.lifecycle == Lifecycle::Alive {
            self.editing = false;
            self.cached = false;
            self.lifecycle = Lifecycle::Removing;
        }
    }

    /// Final teardown. Runs the first pass if it has not happened yet.
    pub(crate) fn destroy_second_pass(&mut self) {
        self.destroy_first_pass();
        self.lifecycle = Lifecycle::Destroyed;
    }
}
