//! Server-side row model: nested stores and display-index mapping.
//!
//! Every group row owns a child store holding its loaded children. Display
//! indices are assigned by a single depth-first pass over the expanded tree
//! ([`ServerSideRowModel::refresh`]); lookups by index binary-search each
//! store's node list and descend into child stores or detail rows.

use tracing::error;

use super::error::ModelError;
use super::row_model::{RowModel, RowModelKind};
use super::row_node::{NodeId, RowId, RowNode, RowNodeTable, StoreId};

/// One block of sibling rows, sorted by display index.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSideStore {
    parent_node: Option<NodeId>,
    level: i32,
    nodes: Vec<NodeId>,
    /// First display index owned by this store, `None` while hidden.
    display_index_start: Option<usize>,
    /// One past the last display index owned by this store.
    display_index_end: Option<usize>,
    top_px: i64,
    height_px: i64,
}

impl ServerSideStore {
    fn new(parent_node: Option<NodeId>, level: i32) -> Self {
        Self {
            parent_node,
            level,
            nodes: Vec::new(),
            display_index_start: None,
            display_index_end: None,
            top_px: 0,
            height_px: 0,
        }
    }

    /// Group row owning this store. `None` for the root store.
    pub fn parent_node(&self) -> Option<NodeId> {
        self.parent_node
    }

    /// Rows in this store, in display order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Whether `index` falls inside this store's display range.
    pub fn is_display_index_in_store(&self, index: usize) -> bool {
        match (self.display_index_start, self.display_index_end) {
            (Some(start), Some(end)) => index >= start && index < end,
            _ => false,
        }
    }

    /// Pixel bounds as `(top, height)`.
    pub fn bounds(&self) -> (i64, i64) {
        (self.top_px, self.height_px)
    }

    /// Display index range, if displayed.
    pub fn display_range(&self) -> Option<std::ops::Range<usize>> {
        Some(self.display_index_start?..self.display_index_end?)
    }
}

/// Server-side row model.
#[derive(Debug, Clone)]
pub struct ServerSideRowModel {
    nodes: RowNodeTable,
    stores: Vec<ServerSideStore>,
    root: NodeId,
    root_store: StoreId,
    default_row_height: i64,
    row_count: usize,
}

impl ServerSideRowModel {
    /// Create a model with an empty root store.
    pub fn new(default_row_height: i64) -> Self {
        let mut nodes = RowNodeTable::new();
        let mut root_node = RowNode::root();
        root_node.child_store = Some(StoreId(0));
        let root = nodes.insert(root_node);
        Self {
            nodes,
            stores: vec![ServerSideStore::new(Some(root), 0)],
            root,
            root_store: StoreId(0),
            default_row_height,
            row_count: 0,
        }
    }

    /// Store holding the top-level rows.
    pub fn root_store(&self) -> StoreId {
        self.root_store
    }

    /// Store behind `id`.
    pub fn store(&self, id: StoreId) -> Option<&ServerSideStore> {
        self.stores.get(id.0)
    }

    fn store_mut(&mut self, id: StoreId) -> Result<&mut ServerSideStore, ModelError> {
        self.stores.get_mut(id.0).ok_or(ModelError::UnknownStore(id))
    }

    /// Append a row to `store`. `id: None` appends a loading stub.
    pub fn add_row(&mut self, store: StoreId, id: Option<&str>) -> Result<NodeId, ModelError> {
        let node = self.push_node(store, id)?;
        self.refresh();
        Ok(node)
    }

    /// Append a group row and create its (empty) child store.
    pub fn add_group(
        &mut self,
        store: StoreId,
        id: &str,
        expanded: bool,
    ) -> Result<(NodeId, StoreId), ModelError> {
        let node = self.push_node(store, Some(id))?;
        let level = self.store_mut(store)?.level;
        let child_store = StoreId(self.stores.len());
        self.stores.push(ServerSideStore::new(Some(node), level + 1));

        let row = self.nodes.node_mut(node)?;
        row.group = true;
        row.expanded = expanded;
        row.child_store = Some(child_store);

        self.refresh();
        Ok((node, child_store))
    }

    /// Append a master row and its detail row.
    pub fn add_master(
        &mut self,
        store: StoreId,
        id: &str,
        expanded: bool,
        detail_height: i64,
    ) -> Result<NodeId, ModelError> {
        let master = self.push_node(store, Some(id))?;
        let level = self.nodes.node(master)?.level;

        let mut detail = RowNode::new(Some(RowId::new(format!("detail_{id}"))), detail_height);
        detail.detail = true;
        detail.full_width = true;
        detail.parent = Some(master);
        detail.level = level + 1;
        let detail = self.nodes.insert(detail);

        let row = self.nodes.node_mut(master)?;
        row.master = true;
        row.expanded = expanded;
        row.detail_node = Some(detail);

        self.refresh();
        Ok(master)
    }

    /// Replace the rows of `store`, as a completed block load would.
    /// Previous rows are detached and their geometry cleared.
    pub fn load_rows<'a>(
        &mut self,
        store: StoreId,
        ids: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Result<Vec<NodeId>, ModelError> {
        let old = std::mem::take(&mut self.store_mut(store)?.nodes);
        for node in old {
            self.clear_node_display(node);
        }
        let mut added = Vec::new();
        for id in ids {
            added.push(self.push_node(store, id)?);
        }
        self.refresh();
        Ok(added)
    }

    /// Expand or collapse a group or master row.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) -> Result<(), ModelError> {
        self.nodes.node_mut(node)?.expanded = expanded;
        self.refresh();
        Ok(())
    }

    /// Remove a row from its store.
    pub fn remove_row(&mut self, node: NodeId) -> Result<(), ModelError> {
        let parent = self.nodes.node(node)?.parent;
        let store = parent
            .and_then(|p| self.nodes.get(p))
            .and_then(|p| p.child_store);
        if let Some(store) = store {
            self.store_mut(store)?.nodes.retain(|n| *n != node);
        }
        self.clear_node_display(node);
        self.refresh();
        Ok(())
    }

    /// Reassign every display index and row top from the root store.
    pub fn refresh(&mut self) {
        let mut seq = 0;
        let mut top = 0;
        self.set_display_indexes(self.root_store, &mut seq, &mut top);
        self.row_count = seq;
    }

    /// Depth-first numbering of `store`: each row, then its detail row if
    /// an expanded master, then its child store if an expanded group.
    /// Collapsed branches are cleared so stale geometry cannot be hit-tested.
    pub fn set_display_indexes(&mut self, store: StoreId, seq: &mut usize, top: &mut i64) {
        let Some(rows) = self.stores.get(store.0).map(|s| s.nodes.clone()) else {
            return;
        };
        let start = *seq;
        let store_top = *top;

        for id in rows {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.set_display(*seq, *top);
            *seq += 1;
            *top += node.row_height;

            let (master_open, detail) = (node.master && node.expanded, node.detail_node);
            let (group_open, child_store) = (node.group && node.expanded, node.child_store);

            if let Some(detail) = detail.and_then(|d| self.nodes.get_mut(d)) {
                if master_open {
                    detail.set_display(*seq, *top);
                    *seq += 1;
                    *top += detail.row_height;
                } else {
                    detail.clear_display();
                }
            }

            if let Some(child_store) = child_store {
                if group_open {
                    self.set_display_indexes(child_store, seq, top);
                } else {
                    self.clear_display_indexes(child_store);
                }
            }
        }

        if let Some(s) = self.stores.get_mut(store.0) {
            s.display_index_start = Some(start);
            s.display_index_end = Some(*seq);
            s.top_px = store_top;
            s.height_px = *top - store_top;
        }
    }

    /// Clear display state for every row in `store` and below.
    pub fn clear_display_indexes(&mut self, store: StoreId) {
        let Some(s) = self.stores.get_mut(store.0) else {
            return;
        };
        s.display_index_start = None;
        s.display_index_end = None;
        s.height_px = 0;
        let rows = s.nodes.clone();
        for id in rows {
            self.clear_node_display(id);
        }
    }

    fn clear_node_display(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.clear_display();
        let (detail, child_store) = (node.detail_node, node.child_store);
        if let Some(detail) = detail.and_then(|d| self.nodes.get_mut(d)) {
            detail.clear_display();
        }
        if let Some(child_store) = child_store {
            self.clear_display_indexes(child_store);
        }
    }

    /// Node at global display `index`, searching from `store`.
    pub fn row_at_display_index(&self, store: StoreId, index: usize) -> Option<NodeId> {
        let store = self.store(store)?;
        if !store.is_display_index_in_store(index) {
            return None;
        }
        self.binary_search_for_display_index(&store.nodes, index)
    }

    /// Binary search over nodes sorted by display index.
    ///
    /// At each midpoint: exact match, then the detail row of an expanded
    /// master, then the child store of an expanded row whose range contains
    /// `index`; otherwise narrow. Running out of range means index
    /// bookkeeping drifted, which is logged as an internal error.
    pub fn binary_search_for_display_index(&self, row_nodes: &[NodeId], index: usize) -> Option<NodeId> {
        if row_nodes.is_empty() {
            return None;
        }

        let mut bottom = 0usize;
        let mut top = row_nodes.len() - 1;
        loop {
            let mid = bottom + (top - bottom) / 2;
            let id = row_nodes[mid];
            let Some(node) = self.nodes.get(id) else {
                error!(?id, "row node missing from server-side store");
                return None;
            };

            if node.row_index == Some(index) {
                return Some(id);
            }

            if node.master && node.expanded {
                if let Some(detail) = node.detail_node {
                    if self.nodes.get(detail).and_then(|d| d.row_index) == Some(index) {
                        return Some(detail);
                    }
                }
            }

            if node.expanded {
                if let Some(child_store) = node.child_store {
                    if self
                        .store(child_store)
                        .is_some_and(|s| s.is_display_index_in_store(index))
                    {
                        return self.row_at_display_index(child_store, index);
                    }
                }
            }

            let Some(node_index) = node.row_index else {
                error!(?id, index, "undisplayed row inside a displayed store");
                return None;
            };
            if node_index < index {
                bottom = mid + 1;
            } else if mid == 0 {
                break;
            } else {
                top = mid - 1;
            }
            if bottom > top {
                break;
            }
        }

        error!(index, "unable to locate display index in server-side store");
        None
    }

    fn pixel_lookup(&self, store: StoreId, pixel: i64) -> Option<usize> {
        let store = self.store(store)?;
        let after = store.nodes.partition_point(|id| {
            self.nodes
                .get(*id)
                .and_then(|n| n.row_top)
                .is_some_and(|top| top <= pixel)
        });
        let candidate_id = *store.nodes.get(after.saturating_sub(1))?;
        let candidate = self.nodes.get(candidate_id)?;

        if candidate.contains_pixel(pixel) {
            return candidate.row_index;
        }
        if candidate.master && candidate.expanded {
            if let Some(detail) = candidate.detail_node.and_then(|d| self.nodes.get(d)) {
                if detail.contains_pixel(pixel) {
                    return detail.row_index;
                }
            }
        }
        if candidate.expanded {
            if let Some(child_store) = candidate.child_store {
                let found = self
                    .store(child_store)
                    .filter(|s| s.display_index_start.is_some())
                    .filter(|s| pixel >= s.top_px && pixel < s.top_px + s.height_px)
                    .and_then(|_| self.pixel_lookup(child_store, pixel));
                if found.is_some() {
                    return found;
                }
            }
        }
        candidate.row_index
    }
}

impl RowModel for ServerSideRowModel {
    fn kind(&self) -> RowModelKind {
        RowModelKind::ServerSide
    }

    fn nodes(&self) -> &RowNodeTable {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut RowNodeTable {
        &mut self.nodes
    }

    fn row_at(&self, index: usize) -> Option<NodeId> {
        self.row_at_display_index(self.root_store, index)
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn row_index_at_pixel(&self, pixel: i64) -> Option<usize> {
        if self.row_count == 0 {
            return None;
        }
        let (top, height) = self.store(self.root_store)?.bounds();
        if pixel <= top {
            return Some(0);
        }
        if pixel >= top + height {
            return Some(self.row_count - 1);
        }
        self.pixel_lookup(self.root_store, pixel)
    }

    fn last_descendant_bottom(&self, node: NodeId) -> Option<i64> {
        let row = self.nodes.get(node)?;
        if let Some(store) = row.child_store.and_then(|s| self.store(s)) {
            let (top, height) = store.bounds();
            return Some(top + height);
        }
        row.detail_node
            .and_then(|d| self.nodes.get(d))
            .and_then(RowNode::row_bottom)
    }
}

impl ServerSideRowModel {
    fn push_node(&mut self, store: StoreId, id: Option<&str>) -> Result<NodeId, ModelError> {
        let root = self.root;
        let (parent, level) = {
            let s = self.store_mut(store)?;
            (s.parent_node.unwrap_or(root), s.level)
        };
        let mut node = RowNode::new(id.map(RowId::new), self.default_row_height);
        node.parent = Some(parent);
        node.level = level;
        let node = self.nodes.insert(node);
        self.store_mut(store)?.nodes.push(node);
        Ok(node)
    }
}

#[cfg(test)]
#[path = "server_side_tests.rs"]
mod tests;
