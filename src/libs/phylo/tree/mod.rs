pub mod io;
pub mod ops;
pub mod support;
pub mod traversal;

use super::node::{Node, NodeId};

/// A phylogenetic tree stored as an arena of nodes.
///
/// Trees built here are rooted for storage; an unrooted reading of the same
/// tree is available through [`Tree::branches`].
#[derive(Debug, Default, Clone)]
pub struct Tree {
    pub(super) nodes: Vec<Node>,
    pub(super) root: Option<NodeId>,
}

/// One branch of the unrooted tree.
///
/// `lower` is the node whose subtree forms one side of the branch. For the
/// two edges below a bifurcating root the lengths are summed into one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub upper: NodeId,
    pub lower: NodeId,
    pub length: f64,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new detached node. Returns its ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Add a named leaf node.
    pub fn add_leaf(&mut self, name: &str) -> NodeId {
        let id = self.add_node();
        self.nodes[id].set_name(name);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        if id < self.nodes.len() {
            self.root = Some(id);
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    // --- Delegation to ops ---

    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
        ops::add_child(self, parent_id, child_id)
    }

    /// Link `child_id` under `parent_id` with a branch length.
    pub fn attach(&mut self, parent_id: NodeId, child_id: NodeId, length: f64) -> Result<(), String> {
        ops::add_child(self, parent_id, child_id)?;
        self.nodes[child_id].length = Some(length);
        Ok(())
    }

    pub fn branches(&self) -> Vec<Branch> {
        ops::branches(self)
    }

    // --- Delegation to traversal ---

    pub fn preorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::preorder(self, start_node)
    }

    pub fn postorder(&self, start_node: NodeId) -> Vec<NodeId> {
        traversal::postorder(self, start_node)
    }

    /// Leaf IDs reachable from the root, left to right.
    pub fn get_leaves(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self
                .preorder(root)
                .into_iter()
                .filter(|&id| self.nodes[id].is_leaf())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Names of the leaves, left to right. Unnamed leaves are skipped.
    pub fn get_leaf_names(&self) -> Vec<String> {
        self.get_leaves()
            .into_iter()
            .filter_map(|id| self.nodes[id].name.clone())
            .collect()
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.name.as_deref() == Some(name))
            .map(|n| n.id)
    }

    // --- Delegation to io ---

    pub fn to_newick(&self) -> String {
        io::to_newick(self)
    }

    pub fn to_newick_with_format(&self, indent: &str) -> String {
        io::to_newick_with_format(self, indent)
    }

    pub fn to_dot(&self) -> String {
        io::to_dot(self)
    }
}
