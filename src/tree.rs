//! Tree data structure implementation for MCTS
//!
//! Nodes live in a contiguous arena and are addressed by [`NodeId`]. Parent
//! links are plain indices, so the tree has no ownership cycles and is
//! dropped in one go once a decision is made.

use serde::Serialize;

/// Handle to a node inside a [`Tree`].
///
/// Identifiers are handed out in creation order, so comparing two ids tells
/// which node was created first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the tree structure
///
/// # Type Parameters
/// - `T`: The data type stored in the node
#[derive(Debug)]
pub struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: T,
}

impl<T> Node<T> {
    /// Checks if this node is the root (has no parent)
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Gets the parent node if it exists
    #[inline]
    pub fn get_parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Gets the `i`-th child in creation order
    #[inline]
    pub fn get_child(&self, i: usize) -> Option<NodeId> {
        self.children.get(i).copied()
    }

    /// All children in creation order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Gets a reference to the node's data
    #[inline]
    pub fn get(&self) -> &T {
        &self.data
    }

    /// Gets a mutable reference to the node's data
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// Arena owning every node of one search tree.
#[derive(Debug)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tree<T> {
    /// Creates a tree holding only a root with the given data
    pub fn new_root(data: T) -> Self {
        Tree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data,
            }],
        }
    }

    /// The root is always the first node allocated
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Adds a new child under `parent` and returns its id
    ///
    /// # Panics
    /// If `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, data: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes[parent.0].children.push(id);
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id.0].data
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id.0].data
    }

    /// Number of nodes ever allocated
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root, so this is never true
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node allocated at or after position `start`, in creation order
    pub fn ids_from(&self, start: usize) -> impl Iterator<Item = NodeId> {
        (start.min(self.nodes.len())..self.nodes.len()).map(NodeId)
    }

    /// Ids from `id` up to and including the root
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes[parent.0].parent;
        }
        path
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.path_to_root(id).len() - 1
    }
}
