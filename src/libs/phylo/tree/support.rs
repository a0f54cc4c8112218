use super::Tree;
use crate::libs::error::{ProtreeError, Result};
use crate::libs::phylo::node::NodeId;
use fixedbitset::FixedBitSet;
use std::collections::{HashMap, HashSet};

/// A split of the leaf set induced by one branch of an unrooted tree.
///
/// Stored as the side that contains leaf 0, so that the two descriptions of
/// the same split compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bipartition(FixedBitSet);

impl Bipartition {
    /// Normalize a leaf set to the side containing leaf 0.
    pub fn new(mut side: FixedBitSet) -> Self {
        if !side.contains(0) {
            side.toggle_range(..);
        }
        Bipartition(side)
    }

    pub fn bits(&self) -> &FixedBitSet {
        &self.0
    }

    /// Size of the smaller side.
    pub fn minor_size(&self) -> usize {
        let ones = self.0.count_ones(..);
        ones.min(self.0.len() - ones)
    }

    /// A split is trivial when one side holds at most one leaf.
    pub fn is_trivial(&self) -> bool {
        self.minor_size() <= 1
    }
}

/// Leaf name to bit index. Names are sorted so that trees built from the
/// same sequences in any order share one mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LeafMap {
    pub fn from_names(names: &[String]) -> Result<Self> {
        let mut sorted = names.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != names.len() {
            return Err(ProtreeError::InvalidParameter(
                "duplicate leaf names".to_string(),
            ));
        }
        let index = sorted
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Ok(Self {
            names: sorted,
            index,
        })
    }

    pub fn from_tree(tree: &Tree) -> Result<Self> {
        let leaves = tree.get_leaves();
        let names = tree.get_leaf_names();
        if names.len() != leaves.len() {
            return Err(ProtreeError::Tree("leaf node missing name".to_string()));
        }
        Self::from_names(&names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Leaf set below every node, computed in one postorder pass.
pub fn node_bitsets(tree: &Tree, leaf_map: &LeafMap) -> Result<HashMap<NodeId, FixedBitSet>> {
    let num_leaves = leaf_map.len();
    let mut node_bitsets: HashMap<NodeId, FixedBitSet> = HashMap::new();

    if let Some(root) = tree.get_root() {
        for id in tree.postorder(root) {
            let node = &tree.nodes[id];
            let mut bitset = FixedBitSet::with_capacity(num_leaves);

            if node.is_leaf() {
                let name = node
                    .name
                    .as_deref()
                    .ok_or_else(|| ProtreeError::Tree("leaf node missing name".to_string()))?;
                let idx = leaf_map
                    .get(name)
                    .ok_or_else(|| ProtreeError::Tree(format!("unknown leaf {}", name)))?;
                bitset.insert(idx);
            } else {
                for child in &node.children {
                    if let Some(child_bs) = node_bitsets.get(child) {
                        bitset.union_with(child_bs);
                    }
                }
            }
            node_bitsets.insert(id, bitset);
        }
    }

    Ok(node_bitsets)
}

/// Non-trivial splits of the unrooted tree, keyed by the internal node
/// whose subtree defines them.
///
/// The root and leaves are skipped. Below a bifurcating root both children
/// describe the same split; only one entry is kept.
pub fn bipartitions(tree: &Tree, leaf_map: &LeafMap) -> Result<Vec<(NodeId, Bipartition)>> {
    let bitsets = node_bitsets(tree, leaf_map)?;
    let root = match tree.get_root() {
        Some(root) => root,
        None => return Ok(Vec::new()),
    };

    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for id in tree.preorder(root) {
        let node = &tree.nodes[id];
        if id == root || node.is_leaf() {
            continue;
        }
        let split = Bipartition::new(bitsets[&id].clone());
        if split.is_trivial() {
            continue;
        }
        if seen.insert(split.clone()) {
            result.push((id, split));
        }
    }

    Ok(result)
}

/// The set of non-trivial splits of a tree.
pub fn split_set(tree: &Tree, leaf_map: &LeafMap) -> Result<HashSet<Bipartition>> {
    Ok(bipartitions(tree, leaf_map)?
        .into_iter()
        .map(|(_, split)| split)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ((A,B),(C,D)) rooted at the middle, plus E on the left cherry
    fn sample() -> Tree {
        let mut tree = Tree::new();
        let a = tree.add_leaf("A");
        let b = tree.add_leaf("B");
        let c = tree.add_leaf("C");
        let d = tree.add_leaf("D");
        let e = tree.add_leaf("E");
        let ab = tree.add_node();
        let abe = tree.add_node();
        let cd = tree.add_node();
        let root = tree.add_node();
        tree.attach(ab, a, 1.0).unwrap();
        tree.attach(ab, b, 1.0).unwrap();
        tree.attach(abe, ab, 1.0).unwrap();
        tree.attach(abe, e, 1.0).unwrap();
        tree.attach(cd, c, 1.0).unwrap();
        tree.attach(cd, d, 1.0).unwrap();
        tree.attach(root, abe, 1.0).unwrap();
        tree.attach(root, cd, 1.0).unwrap();
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_leaf_map_sorted() {
        let names = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let map = LeafMap::from_names(&names).unwrap();
        assert_eq!(map.get("a"), Some(0));
        assert_eq!(map.get("c"), Some(2));
        assert_eq!(map.get("z"), None);

        let dup = vec!["a".to_string(), "a".to_string()];
        assert!(LeafMap::from_names(&dup).is_err());
    }

    #[test]
    fn test_bipartition_normalized() {
        let mut side = FixedBitSet::with_capacity(4);
        side.insert(2);
        side.insert(3);
        let split = Bipartition::new(side);
        assert!(split.bits().contains(0));
        assert!(split.bits().contains(1));
        assert!(!split.bits().contains(2));
        assert_eq!(split.minor_size(), 2);
        assert!(!split.is_trivial());
    }

    #[test]
    fn test_bipartitions() {
        let tree = sample();
        let map = LeafMap::from_tree(&tree).unwrap();
        let splits = bipartitions(&tree, &map).unwrap();

        // AB|CDE and ABE|CD; the root edge is shared by abe and cd
        assert_eq!(splits.len(), 2);
        let set = split_set(&tree, &map).unwrap();
        assert_eq!(set.len(), 2);

        let mut ab = FixedBitSet::with_capacity(5);
        ab.insert(0);
        ab.insert(1);
        assert!(set.contains(&Bipartition::new(ab)));
    }

    #[test]
    fn test_same_topology_different_rooting() {
        // (((A,B),E),(C,D)) vs ((A,B),(E,(C,D)))
        let tree1 = sample();

        let mut tree2 = Tree::new();
        let a = tree2.add_leaf("A");
        let b = tree2.add_leaf("B");
        let c = tree2.add_leaf("C");
        let d = tree2.add_leaf("D");
        let e = tree2.add_leaf("E");
        let ab = tree2.add_node();
        let cd = tree2.add_node();
        let ecd = tree2.add_node();
        let root = tree2.add_node();
        tree2.attach(ab, a, 1.0).unwrap();
        tree2.attach(ab, b, 1.0).unwrap();
        tree2.attach(cd, c, 1.0).unwrap();
        tree2.attach(cd, d, 1.0).unwrap();
        tree2.attach(ecd, e, 1.0).unwrap();
        tree2.attach(ecd, cd, 1.0).unwrap();
        tree2.attach(root, ab, 1.0).unwrap();
        tree2.attach(root, ecd, 1.0).unwrap();
        tree2.set_root(root);

        let map = LeafMap::from_tree(&tree1).unwrap();
        assert_eq!(
            split_set(&tree1, &map).unwrap(),
            split_set(&tree2, &map).unwrap()
        );
    }
}
