use super::{Branch, Tree};
use crate::libs::phylo::node::NodeId;

/// Add a child to a parent node.
/// Updates both parent's `children` list and child's `parent` field.
pub fn add_child(tree: &mut Tree, parent_id: NodeId, child_id: NodeId) -> Result<(), String> {
    if parent_id == child_id {
        return Err("Cannot add node as child of itself".to_string());
    }
    if parent_id >= tree.nodes.len() {
        return Err(format!("Parent node {} not found", parent_id));
    }
    if child_id >= tree.nodes.len() {
        return Err(format!("Child node {} not found", child_id));
    }
    if let Some(old_parent) = tree.nodes[child_id].parent {
        return Err(format!(
            "Node {} already has parent {}",
            child_id, old_parent
        ));
    }

    tree.nodes[child_id].parent = Some(parent_id);
    tree.nodes[parent_id].children.push(child_id);

    Ok(())
}

/// List the branches of the tree read as unrooted.
///
/// Every non-root node contributes the branch to its parent. When the root
/// has exactly two children the root is not a real vertex of the unrooted
/// tree, so its two edges are reported as a single branch.
pub fn branches(tree: &Tree) -> Vec<Branch> {
    let root = match tree.get_root() {
        Some(id) => id,
        None => return Vec::new(),
    };

    let root_children = &tree.nodes[root].children;
    let merge_root = root_children.len() == 2;

    let mut result = Vec::new();
    for id in tree.preorder(root) {
        let node = &tree.nodes[id];
        let parent = match node.parent {
            Some(p) => p,
            None => continue,
        };
        let length = node.length.unwrap_or(0.0);

        if merge_root && parent == root {
            // Emit once, from the first child, spanning both root edges
            if id == root_children[0] {
                let other = root_children[1];
                result.push(Branch {
                    upper: other,
                    lower: id,
                    length: length + tree.nodes[other].length.unwrap_or(0.0),
                });
            }
            continue;
        }

        result.push(Branch {
            upper: parent,
            lower: id,
            length,
        });
    }

    result
}
