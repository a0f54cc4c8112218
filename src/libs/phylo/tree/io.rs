use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Serialize tree to a single-line Newick string.
///
/// Internal nodes without a name are labelled with their bootstrap support
/// rounded to an integer percentage, when present.
pub fn to_newick(tree: &Tree) -> String {
    to_newick_with_format(tree, "")
}

/// Serialize tree to Newick, indenting each level with `indent`.
/// An empty `indent` gives the single-line form.
pub fn to_newick_with_format(tree: &Tree, indent: &str) -> String {
    let root = match tree.get_root() {
        Some(root) => root,
        None => return ";".to_string(),
    };
    let is_pretty = !indent.is_empty();

    enum Step {
        Enter(NodeId, usize),
        Close(NodeId, usize),
        Comma,
    }

    // Explicit stack; tree depth is unbounded
    let mut s = String::new();
    let mut stack = vec![Step::Enter(root, 0)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, depth) => {
                s.push_str(&indent.repeat(depth));
                let children = &tree.nodes[id].children;
                if children.is_empty() {
                    s.push_str(&node_label(tree, id));
                    continue;
                }
                s.push('(');
                if is_pretty {
                    s.push('\n');
                }
                stack.push(Step::Close(id, depth));
                for (k, &child) in children.iter().enumerate().rev() {
                    stack.push(Step::Enter(child, depth + 1));
                    if k > 0 {
                        stack.push(Step::Comma);
                    }
                }
            }
            Step::Comma => {
                s.push(',');
                if is_pretty {
                    s.push('\n');
                }
            }
            Step::Close(id, depth) => {
                if is_pretty {
                    s.push('\n');
                    s.push_str(&indent.repeat(depth));
                }
                s.push(')');
                s.push_str(&node_label(tree, id));
            }
        }
    }
    s.push(';');
    s
}

fn node_label(tree: &Tree, node_id: NodeId) -> String {
    let node = &tree.nodes[node_id];
    let mut info = String::new();

    match (&node.name, node.support) {
        (Some(name), _) => info.push_str(&quote_label(name)),
        (None, Some(support)) if !node.is_leaf() => {
            info.push_str(&format!("{:.0}", support));
        }
        _ => {}
    }

    if let Some(len) = node.length {
        info.push_str(&format!(":{}", len));
    }

    info
}

/// Serialize the tree to a Graphviz DOT string.
///
/// Leaves are labelled with their names, internal nodes with their support
/// (when present); edges carry branch lengths.
pub fn to_dot(tree: &Tree) -> String {
    let mut s = String::from("digraph Tree {\n");
    s.push_str("    node [shape=box];\n");

    if let Some(root) = tree.get_root() {
        for node_id in tree.preorder(root) {
            let node = &tree.nodes[node_id];

            let label = match (&node.name, node.support) {
                (Some(name), _) => name.clone(),
                (None, Some(support)) => format!("{:.0}", support),
                (None, None) => String::new(),
            };
            if label.is_empty() {
                s.push_str(&format!("    {} [label=\"\", shape=point];\n", node_id));
            } else {
                s.push_str(&format!("    {} [label=\"{}\"];\n", node_id, label));
            }

            for &child_id in &node.children {
                match tree.nodes[child_id].length {
                    Some(len) => s.push_str(&format!(
                        "    {} -> {} [label=\"{}\"];\n",
                        node_id, child_id, len
                    )),
                    None => s.push_str(&format!("    {} -> {};\n", node_id, child_id)),
                }
            }
        }
    }

    s.push_str("}\n");
    s
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:;[] \t\n'".contains(c));
    if needs_quote {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cherry() -> Tree {
        //      root
        //     /    \
        //    u      C:0.3
        //   / \
        //  A   B
        let mut tree = Tree::new();
        let a = tree.add_leaf("A");
        let b = tree.add_leaf("B");
        let c = tree.add_leaf("C");
        let u = tree.add_node();
        let root = tree.add_node();
        tree.attach(u, a, 0.1).unwrap();
        tree.attach(u, b, 0.2).unwrap();
        tree.attach(root, u, 0.05).unwrap();
        tree.attach(root, c, 0.3).unwrap();
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_to_newick() {
        let mut tree = cherry();
        assert_eq!(to_newick(&tree), "((A:0.1,B:0.2):0.05,C:0.3);");

        tree.get_node_mut(3).unwrap().support = Some(87.6);
        assert_eq!(to_newick(&tree), "((A:0.1,B:0.2)88:0.05,C:0.3);");

        let expected = "(\n  (\n    A:0.1,\n    B:0.2\n  )88:0.05,\n  C:0.3\n);";
        assert_eq!(to_newick_with_format(&tree, "  "), expected);
    }

    #[test]
    fn test_to_newick_quotes() {
        let mut tree = Tree::new();
        let n0 = tree.add_leaf("sp|P1 human");
        tree.set_root(n0);
        assert_eq!(to_newick(&tree), "'sp|P1 human';");

        assert_eq!(to_newick(&Tree::new()), ";");
    }

    #[test]
    fn test_to_dot() {
        let mut tree = cherry();
        tree.get_node_mut(3).unwrap().support = Some(100.0);
        let dot = to_dot(&tree);
        assert!(dot.starts_with("digraph Tree {"));
        assert!(dot.contains("0 [label=\"A\"];"));
        assert!(dot.contains("3 [label=\"100\"];"));
        assert!(dot.contains("4 [label=\"\", shape=point];"));
        assert!(dot.contains("3 -> 0 [label=\"0.1\"];"));
    }
}
