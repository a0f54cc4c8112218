/// NodeId is an index into the Tree's node vector.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Index in the arena
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    /// Sequence id for leaves; internal nodes are usually unnamed
    pub name: Option<String>,

    /// Length of the branch to the parent
    pub length: Option<f64>,

    /// Bootstrap support (percent) of the branch to the parent.
    /// Only internal nodes carry it.
    pub support: Option<f64>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            name: None,
            length: None,
            support: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// A node is a leaf when it has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
