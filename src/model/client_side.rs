//! In-memory row model over a node tree.
//!
//! Groups own their children in display order; expanded masters are followed
//! by their detail row. The flattened display order is rebuilt on every
//! structural change and row tops are kept in a [`HeightIndex`].

use super::error::ModelError;
use super::row_model::{RowModel, RowModelKind};
use super::row_node::{NodeId, RowId, RowNode, RowNodeTable};
use crate::view_state::height_index::HeightIndex;

/// Computes the real height of a row whose height was estimated.
pub type RowHeightFn = Box<dyn Fn(&RowNode) -> i64>;

/// Client-side row model.
pub struct ClientSideRowModel {
    nodes: RowNodeTable,
    root: NodeId,
    rows_to_display: Vec<NodeId>,
    heights: HeightIndex,
    default_row_height: i64,
    row_height_fn: Option<RowHeightFn>,
}

impl std::fmt::Debug for ClientSideRowModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSideRowModel")
            .field("rows_to_display", &self.rows_to_display.len())
            .field("default_row_height", &self.default_row_height)
            .field("lazy_heights", &self.row_height_fn.is_some())
            .finish()
    }
}

impl ClientSideRowModel {
    /// Create an empty model whose rows default to `default_row_height` px.
    pub fn new(default_row_height: i64) -> Self {
        let mut nodes = RowNodeTable::new();
        let root = nodes.insert(RowNode::root());
        Self {
            nodes,
            root,
            rows_to_display: Vec::new(),
            heights: HeightIndex::default(),
            default_row_height,
            row_height_fn: None,
        }
    }

    /// Rows added after this call start with an estimated height and get
    /// their real height from `height_fn` when first scrolled into view.
    pub fn with_row_height_fn(mut self, height_fn: impl Fn(&RowNode) -> i64 + 'static) -> Self {
        self.row_height_fn = Some(Box::new(height_fn));
        self
    }

    /// Create a flat model with one row per id.
    pub fn from_ids<'a>(default_row_height: i64, ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut model = Self::new(default_row_height);
        for id in ids {
            model.push_child(model.root, RowNode::new(Some(RowId::new(id)), default_row_height));
        }
        model.refresh();
        model
    }

    /// The root sentinel.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Display order.
    pub fn rows_to_display(&self) -> &[NodeId] {
        &self.rows_to_display
    }

    /// Add a data row. `id: None` creates a stub row.
    pub fn add_row(&mut self, parent: Option<NodeId>, id: Option<&str>) -> Result<NodeId, ModelError> {
        let parent = self.group_parent(parent)?;
        let node = self.new_node(id);
        let id = self.push_child(parent, node);
        self.refresh();
        Ok(id)
    }

    /// Add a group row.
    pub fn add_group(&mut self, parent: Option<NodeId>, id: &str, expanded: bool) -> Result<NodeId, ModelError> {
        let parent = self.group_parent(parent)?;
        let mut node = self.new_node(Some(id));
        node.group = true;
        node.expanded = expanded;
        let id = self.push_child(parent, node);
        self.refresh();
        Ok(id)
    }

    /// Add a master row together with its detail row.
    pub fn add_master(
        &mut self,
        parent: Option<NodeId>,
        id: &str,
        expanded: bool,
        detail_height: i64,
    ) -> Result<NodeId, ModelError> {
        let parent = self.group_parent(parent)?;
        let mut node = self.new_node(Some(id));
        node.master = true;
        node.expanded = expanded;
        let master = self.push_child(parent, node);

        let mut detail = RowNode::new(Some(RowId::new(format!("detail_{id}"))), detail_height);
        detail.detail = true;
        detail.full_width = true;
        detail.parent = Some(master);
        detail.level = self.nodes.node(master)?.level + 1;
        let detail = self.nodes.insert(detail);
        self.nodes.node_mut(master)?.detail_node = Some(detail);

        self.refresh();
        Ok(master)
    }

    /// Mark a tree-data node as expandable even while it has no children.
    pub fn set_expandable(&mut self, node: NodeId, expandable: bool) -> Result<(), ModelError> {
        let node = self.nodes.node_mut(node)?;
        node.expandable = expandable;
        node.group = node.group || expandable;
        Ok(())
    }

    /// Expand or collapse a group or master row.
    pub fn set_expanded(&mut self, node: NodeId, expanded: bool) -> Result<(), ModelError> {
        self.nodes.node_mut(node)?.expanded = expanded;
        self.refresh();
        Ok(())
    }

    /// Detach a node (and its subtree) from the tree.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), ModelError> {
        let parent = self.nodes.node(node)?.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != node);
        }
        self.refresh();
        Ok(())
    }

    /// Reorder the children of `parent` by `key`.
    pub fn sort_children_by<K: Ord>(
        &mut self,
        parent: Option<NodeId>,
        mut key: impl FnMut(&RowNode) -> K,
    ) -> Result<(), ModelError> {
        let parent = parent.unwrap_or(self.root);
        let mut children = std::mem::take(&mut self.nodes.node_mut(parent)?.children);
        children.sort_by_cached_key(|child| self.nodes.get(*child).map(&mut key));
        self.nodes.node_mut(parent)?.children = children;
        self.refresh();
        Ok(())
    }

    /// Replace all data with fresh nodes, as a full data reload would. Rows
    /// keep their ids but are new node objects.
    pub fn set_row_data<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.clear();
        for id in ids {
            let node = self.new_node(Some(id));
            self.push_child(self.root, node);
        }
        self.refresh();
    }

    /// Detach every row.
    pub fn clear(&mut self) {
        if let Some(root) = self.nodes.get_mut(self.root) {
            root.children.clear();
        }
        self.refresh();
    }

    /// Change the height of a row.
    pub fn set_row_height(&mut self, node: NodeId, height: i64) -> Result<(), ModelError> {
        let node = self.nodes.node_mut(node)?;
        node.row_height = height;
        node.row_height_estimated = false;
        if let Some(index) = node.row_index {
            self.heights.set(index, height);
            self.update_row_tops();
        }
        Ok(())
    }

    /// Rebuild the display order and every row's index and top.
    pub fn refresh(&mut self) {
        let mut displayed = Vec::with_capacity(self.rows_to_display.len());
        self.flatten(self.root, &mut displayed);

        let all: Vec<NodeId> = self.nodes.iter().map(|(id, _)| id).collect();
        for id in all {
            if let Some(node) = self.nodes.get_mut(id) {
                node.clear_display();
            }
        }

        self.heights = HeightIndex::from_heights(
            displayed
                .iter()
                .map(|id| self.nodes.get(*id).map_or(self.default_row_height, |n| n.row_height)),
        );
        self.rows_to_display = displayed;
        self.update_row_tops();
    }

    fn update_row_tops(&mut self) {
        for (index, id) in self.rows_to_display.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(*id) {
                node.set_display(index, self.heights.top(index));
            }
        }
    }

    fn flatten(&self, parent: NodeId, out: &mut Vec<NodeId>) {
        let Some(parent) = self.nodes.get(parent) else {
            return;
        };
        for &child_id in &parent.children {
            let Some(child) = self.nodes.get(child_id) else {
                continue;
            };
            out.push(child_id);
            if child.master && child.expanded {
                out.extend(child.detail_node);
            }
            if child.group && child.expanded {
                self.flatten(child_id, out);
            }
        }
    }

    fn group_parent(&self, parent: Option<NodeId>) -> Result<NodeId, ModelError> {
        let parent = parent.unwrap_or(self.root);
        if self.nodes.node(parent)?.group {
            Ok(parent)
        } else {
            Err(ModelError::NotAGroup(parent))
        }
    }

    fn new_node(&self, id: Option<&str>) -> RowNode {
        let mut node = RowNode::new(id.map(RowId::new), self.default_row_height);
        node.row_height_estimated = self.row_height_fn.is_some();
        node
    }

    fn push_child(&mut self, parent: NodeId, mut node: RowNode) -> NodeId {
        node.parent = Some(parent);
        node.level = self.nodes.get(parent).map_or(0, |p| p.level + 1);
        let id = self.nodes.insert(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }
}

impl RowModel for ClientSideRowModel {
    fn kind(&self) -> RowModelKind {
        RowModelKind::ClientSide
    }

    fn nodes(&self) -> &RowNodeTable {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut RowNodeTable {
        &mut self.nodes
    }

    fn row_at(&self, index: usize) -> Option<NodeId> {
        self.rows_to_display.get(index).copied()
    }

    fn row_count(&self) -> usize {
        self.rows_to_display.len()
    }

    fn row_index_at_pixel(&self, pixel: i64) -> Option<usize> {
        if self.rows_to_display.is_empty() {
            return None;
        }
        if pixel <= 0 {
            return Some(0);
        }
        self.heights
            .index_at_pixel(pixel)
            .or(Some(self.rows_to_display.len() - 1))
    }

    fn ensure_row_heights_valid(&mut self, start_pixel: i64, end_pixel: i64) -> bool {
        let Some(height_fn) = self.row_height_fn.take() else {
            return false;
        };

        // Resolving heights moves later rows, which can pull new estimated
        // rows into the band, so repeat until nothing changes.
        let mut any_change = false;
        loop {
            let (Some(first), Some(last)) = (
                self.row_index_at_pixel(start_pixel),
                self.row_index_at_pixel(end_pixel),
            ) else {
                break;
            };

            let mut changed = false;
            for index in first..=last {
                let id = self.rows_to_display[index];
                let Some(node) = self.nodes.get_mut(id) else {
                    continue;
                };
                if node.row_height_estimated {
                    let height = height_fn(&*node);
                    node.row_height = height;
                    node.row_height_estimated = false;
                    self.heights.set(index, height);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
            any_change = true;
            self.update_row_tops();
        }

        self.row_height_fn = Some(height_fn);
        any_change
    }

    fn last_descendant_bottom(&self, node: NodeId) -> Option<i64> {
        let mut current = node;
        loop {
            let n = self.nodes.get(current)?;
            if !n.expanded {
                break;
            }
            let next = if n.master {
                n.detail_node
            } else {
                // Tree data can be expandable with no children loaded.
                n.children.last().copied()
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        self.nodes.get(current)?.row_bottom()
    }
}
