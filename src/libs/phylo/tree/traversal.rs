use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Node IDs in preorder (node before its children)
pub fn preorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![start_node];

    while let Some(id) = stack.pop() {
        if let Some(node) = tree.get_node(id) {
            result.push(id);
            // Reverse so the first child is visited first
            stack.extend(node.children.iter().rev());
        }
    }

    result
}

/// Node IDs in postorder (children before their parent)
///
/// Iterative so that deep, caterpillar-shaped trees cannot overflow the stack.
pub fn postorder(tree: &Tree, start_node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![(start_node, false)];

    while let Some((id, expanded)) = stack.pop() {
        let node = match tree.get_node(id) {
            Some(node) => node,
            None => continue,
        };
        if expanded || node.is_leaf() {
            result.push(id);
        } else {
            stack.push((id, true));
            for &child in node.children.iter().rev() {
                stack.push((child, false));
            }
        }
    }

    result
}
