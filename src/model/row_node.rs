//! Row nodes and the node table that owns them.
//!
//! Nodes never own each other. `parent` and `detail_node` are [`NodeId`]
//! handles into the [`RowNodeTable`] held by the row model; only the row
//! model creates or drops nodes.

use std::fmt;

use super::error::ModelError;

/// Stable row identity, unchanged across data refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(String);

impl RowId {
    /// Create a row id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Handle to a node slot in a [`RowNodeTable`].
///
/// Two handles are equal only when they name the same node object, so a full
/// data reload that recreates nodes under the same [`RowId`] yields new
/// handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slot number.
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Handle to a server-side child store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub(crate) usize);

/// Floating (pinned) row placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowPinned {
    /// Rows pinned above the body.
    Top,
    /// Rows pinned below the body.
    Bottom,
}

/// One logical row.
///
/// # Invariants
/// - `row_index`, `row_top` are `Some` iff the node is displayed in the
///   current expanded tree. Hidden nodes have them cleared.
/// - `sticky_row_top` is `Some` only while `sticky` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct RowNode {
    /// Stable id. `None` marks a stub (loading placeholder).
    pub id: Option<RowId>,
    /// Current display index.
    pub row_index: Option<usize>,
    /// Top edge in pixels.
    pub row_top: Option<i64>,
    /// Row height in pixels.
    pub row_height: i64,
    /// Height is a placeholder until computed lazily.
    pub row_height_estimated: bool,
    /// Nesting depth. The root sentinel uses -1.
    pub level: i32,
    /// Group or master row is open.
    pub expanded: bool,
    /// Row groups other rows.
    pub group: bool,
    /// Row owns a detail row.
    pub master: bool,
    /// Row is the detail companion of a master row.
    pub detail: bool,
    /// Rendered across all columns (detail rows, full-width groups).
    pub full_width: bool,
    /// Tree-data node that can expand even without loaded children.
    pub expandable: bool,
    /// Parent group, or the root sentinel.
    pub parent: Option<NodeId>,
    /// Children in display order (client-side model).
    pub children: Vec<NodeId>,
    /// Nested store (server-side model).
    pub child_store: Option<StoreId>,
    /// Companion detail row of a master row.
    pub detail_node: Option<NodeId>,
    /// Row is currently pinned in the sticky band.
    pub sticky: bool,
    /// Offset within the sticky band while pinned.
    pub sticky_row_top: Option<i64>,
    /// Set once a row controller has been created for this node. Guards
    /// against recycling a row removed and re-added in one transaction.
    pub already_rendered: bool,
    /// Floating section this row is shown in, if any.
    pub pinned: Option<RowPinned>,
}

impl RowNode {
    /// Create a plain data row.
    pub fn new(id: Option<RowId>, row_height: i64) -> Self {
        Self {
            id,
            row_index: None,
            row_top: None,
            row_height,
            row_height_estimated: false,
            level: 0,
            expanded: false,
            group: false,
            master: false,
            detail: false,
            full_width: false,
            expandable: false,
            parent: None,
            children: Vec::new(),
            child_store: None,
            detail_node: None,
            sticky: false,
            sticky_row_top: None,
            already_rendered: false,
            pinned: None,
        }
    }

    /// Create the invisible root sentinel.
    pub fn root() -> Self {
        let mut node = Self::new(Some(RowId::new("ROOT_NODE_ID")), 0);
        node.level = -1;
        node.group = true;
        node.expanded = true;
        node
    }

    /// A stub has no stable id and can never be recycled.
    pub fn is_stub(&self) -> bool {
        self.id.is_none()
    }

    /// Displayed in the current expanded tree.
    pub fn is_displayed(&self) -> bool {
        self.row_index.is_some()
    }

    /// Bottom edge in pixels, if displayed.
    pub fn row_bottom(&self) -> Option<i64> {
        self.row_top.map(|top| top + self.row_height)
    }

    /// Whether `pixel` falls inside this row.
    pub fn contains_pixel(&self, pixel: i64) -> bool {
        match self.row_top {
            Some(top) => pixel >= top && pixel < top + self.row_height,
            None => false,
        }
    }

    /// Clear display position and geometry.
    pub fn clear_display(&mut self) {
        self.row_index = None;
        self.row_top = None;
    }

    /// Place the node at a display index and pixel offset.
    pub fn set_display(&mut self, index: usize, top: i64) {
        self.row_index = Some(index);
        self.row_top = Some(top);
    }
}

/// Arena of row nodes addressed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct RowNodeTable {
    nodes: Vec<RowNode>,
}

impl RowNodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle.
    pub fn insert(&mut self, node: RowNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Node behind `id`, if the handle is valid.
    pub fn get(&self, id: NodeId) -> Option<&RowNode> {
        self.nodes.get(id.0)
    }

    /// Mutable node behind `id`, if the handle is valid.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut RowNode> {
        self.nodes.get_mut(id.0)
    }

    /// Like [`get`](Self::get) but reports unknown handles as an error.
    pub fn node(&self, id: NodeId) -> Result<&RowNode, ModelError> {
        self.get(id).ok_or(ModelError::UnknownNode(id))
    }

    /// Like [`get_mut`](Self::get_mut) but reports unknown handles as an error.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut RowNode, ModelError> {
        self.get_mut(id).ok_or(ModelError::UnknownNode(id))
    }

    /// Number of nodes ever inserted.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node was inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate every node slot with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &RowNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Ancestors of `id` from the immediate parent outward, excluding the
    /// root sentinel.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent_id) = current {
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            if parent.level < 0 {
                break;
            }
            out.push(parent_id);
            current = parent.parent;
        }
        out
    }

    /// Find the node currently carrying `row_id`, preferring displayed nodes.
    pub fn find_by_row_id(&self, row_id: &RowId) -> Option<NodeId> {
        let mut fallback = None;
        for (id, node) in self.iter() {
            if node.id.as_ref() == Some(row_id) {
                if node.is_displayed() {
                    return Some(id);
                }
                fallback.get_or_insert(id);
            }
        }
        fallback
    }
}
