//! Lazily expanded cache of visited hierarchy levels.
//!
//! Nodes live in an arena and refer to their parent by id, so ownership only
//! flows downward. The tree never performs I/O: callers fetch listings and
//! hand them over through [`NavTree::attach`] and [`NavTree::refresh`].

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::remote::Entry;

/// Handle to a node inside a [`NavTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One cached level of the hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    key: String,
    parent: Option<NodeId>,
    children: HashMap<String, NodeId>,
    entries: Vec<Entry>,
    cursor: usize,
}

impl Node {
    fn new(key: String, parent: Option<NodeId>, entries: Vec<Entry>) -> Self {
        Self {
            key,
            parent,
            children: HashMap::new(),
            entries,
            cursor: 0,
        }
    }

    /// Bucket name or key prefix this level represents; empty for the root.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.entries.get(self.cursor)
    }
}

/// Append-only navigation tree
#[derive(Debug, Clone)]
pub struct NavTree {
    nodes: Vec<Node>,
}

impl NavTree {
    const ROOT: NodeId = NodeId(0);

    /// Create the tree with the top-level (container) listing.
    pub fn new(root_entries: Vec<Entry>) -> Self {
        Self {
            nodes: vec![Node::new(String::new(), None, root_entries)],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn key(&self, id: NodeId) -> &str {
        self.node(id).key()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of cached levels, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    /// True for a bucket's top level (no sub-prefix).
    pub fn is_container_root(&self, id: NodeId) -> bool {
        self.node(id).parent == Some(Self::ROOT)
    }

    /// Cached child for `key`, if this level was visited before.
    pub fn descend_into(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.node(id).children.get(key).copied()
    }

    /// Attach a freshly fetched level under `parent`.
    ///
    /// An already attached key keeps its existing node (and cursor); the
    /// given entries are discarded.
    pub fn attach(&mut self, parent: NodeId, key: &str, entries: Vec<Entry>) -> NodeId {
        if let Some(existing) = self.descend_into(parent, key) {
            return existing;
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(key.to_string(), Some(parent), entries));
        self.node_mut(parent).children.insert(key.to_string(), id);
        tracing::debug!(
            "Attached node {:?} key={:?} under {:?}",
            id,
            key,
            self.node(parent).key
        );
        id
    }

    pub fn ascend(&self, id: NodeId) -> Result<NodeId> {
        self.node(id).parent.ok_or(Error::NoParent)
    }

    /// Replace a level's entries, keeping the cursor in bounds.
    pub fn refresh(&mut self, id: NodeId, fresh: Vec<Entry>) {
        let node = self.node_mut(id);
        node.cursor = node.cursor.min(fresh.len().saturating_sub(1));
        node.entries = fresh;
    }

    /// Move the cursor by `delta`, clamped to the listing. Returns the new index.
    pub fn move_cursor(&mut self, id: NodeId, delta: isize) -> usize {
        let node = self.node_mut(id);
        if node.entries.is_empty() {
            return node.cursor;
        }
        let last = node.entries.len() - 1;
        node.cursor = node.cursor.saturating_add_signed(delta).min(last);
        node.cursor
    }

    pub fn selected(&self, id: NodeId) -> Option<&Entry> {
        self.node(id).selected()
    }
}
