use crate::libs::error::{ProtreeError, Result};
use crate::libs::phylo::distance::DistanceMatrix;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::tree::Tree;
use log::debug;

/// Relative tolerance under which two NJ criterion values count as equal.
const TIE_EPSILON: f64 = 1e-9;

/// Build a rooted tree from a distance matrix using UPGMA.
///
/// Leaf `i` of the result has node ID `i` and carries the `i`-th name.
/// Of several equally close pairs the first in row-major order is merged.
pub fn upgma(matrix: &DistanceMatrix) -> Result<Tree> {
    let n = matrix.len();
    let mut tree = Tree::new();

    for name in matrix.names() {
        tree.add_leaf(&name);
    }
    if n == 0 {
        return Ok(tree);
    }
    if n == 1 {
        tree.set_root(0);
        return Ok(tree);
    }

    // Working matrix over active clusters; rows and columns are removed on merge
    let mut dists: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| matrix.get(i, j)).collect())
        .collect();
    let mut active: Vec<NodeId> = (0..n).collect();
    let mut heights: Vec<f64> = vec![0.0; n];
    let mut sizes: Vec<usize> = vec![1; n];

    while active.len() > 1 {
        let k = active.len();
        let mut min_dist = f64::MAX;
        let mut pair = (0, 1);
        for i in 0..k {
            for j in (i + 1)..k {
                if dists[i][j] < min_dist {
                    min_dist = dists[i][j];
                    pair = (i, j);
                }
            }
        }

        let (i, j) = pair;
        let (id1, id2) = (active[i], active[j]);
        let new_node = tree.add_node();
        let height = (min_dist / 2.0).max(heights[id1]).max(heights[id2]);
        heights.push(height);

        tree.attach(new_node, id1, height - heights[id1])?;
        tree.attach(new_node, id2, height - heights[id2])?;

        let (size1, size2) = (sizes[id1], sizes[id2]);
        let new_size = size1 + size2;
        sizes.push(new_size);

        // Average linkage to every other cluster
        let new_row: Vec<f64> = (0..k)
            .filter(|&m| m != i && m != j)
            .map(|m| (dists[i][m] * size1 as f64 + dists[j][m] * size2 as f64) / new_size as f64)
            .collect();

        remove_cluster(&mut dists, &mut active, j);
        remove_cluster(&mut dists, &mut active, i);
        push_cluster(&mut dists, &mut active, new_node, new_row);
    }

    tree.set_root(active[0]);
    Ok(tree)
}

/// Build a tree from a distance matrix using Saitou-Nei Neighbor-Joining.
///
/// The result is unrooted in meaning; the last two clusters are joined under
/// a midpoint root so it can be stored and written as a rooted tree.
/// Negative branch lengths are clamped to zero.
///
/// Each cluster is labelled with the smallest original index it contains;
/// ties in the criterion go to the pair with the smallest label sum, then
/// the smallest single label.
pub fn nj(matrix: &DistanceMatrix) -> Result<Tree> {
    let n = matrix.len();
    if n < 2 {
        return Err(ProtreeError::InsufficientInput { needed: 2, got: n });
    }

    let mut tree = Tree::new();
    for name in matrix.names() {
        tree.add_leaf(&name);
    }

    let mut dists: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| matrix.get(i, j)).collect())
        .collect();
    let mut active: Vec<NodeId> = (0..n).collect();
    let mut labels: Vec<usize> = (0..n).collect();

    while active.len() > 2 {
        let k = active.len();
        let r: Vec<f64> = dists.iter().map(|row| row.iter().sum()).collect();

        let mut best: Option<(f64, (usize, usize), (usize, usize))> = None;
        for i in 0..k {
            for j in (i + 1)..k {
                let q = (k as f64 - 2.0) * dists[i][j] - r[i] - r[j];
                let (li, lj) = (labels[i], labels[j]);
                let key = (li + lj, li.min(lj));
                let better = match best {
                    None => true,
                    Some((best_q, _, best_key)) => {
                        let tol = TIE_EPSILON * (1.0 + best_q.abs());
                        q < best_q - tol || ((q - best_q).abs() <= tol && key < best_key)
                    }
                };
                if better {
                    best = Some((q, (i, j), key));
                }
            }
        }
        let (i, j) = match best {
            Some((_, pair, _)) => pair,
            None => break,
        };

        let dij = dists[i][j];
        let d = dij.max(0.0);
        let li_raw = dij / 2.0 + (r[i] - r[j]) / (2.0 * (k as f64 - 2.0));
        let li = li_raw.clamp(0.0, d);
        let lj = d - li;

        let new_node = tree.add_node();
        tree.attach(new_node, active[i], li)?;
        tree.attach(new_node, active[j], lj)?;
        debug!(
            "NJ join {} + {} -> {} ({:.4}, {:.4})",
            active[i], active[j], new_node, li, lj
        );

        let new_row: Vec<f64> = (0..k)
            .filter(|&m| m != i && m != j)
            .map(|m| (dists[i][m] + dists[j][m] - dij) / 2.0)
            .collect();
        let new_label = labels[i].min(labels[j]);

        // j > i, so removing j first keeps i valid
        labels.remove(j);
        labels.remove(i);
        labels.push(new_label);
        remove_cluster(&mut dists, &mut active, j);
        remove_cluster(&mut dists, &mut active, i);
        push_cluster(&mut dists, &mut active, new_node, new_row);
    }

    // Final join under a midpoint root
    let half = dists[0][1].max(0.0) / 2.0;
    let root = tree.add_node();
    tree.attach(root, active[0], half)?;
    tree.attach(root, active[1], half)?;
    tree.set_root(root);

    Ok(tree)
}

fn remove_cluster(dists: &mut Vec<Vec<f64>>, active: &mut Vec<NodeId>, idx: usize) {
    dists.remove(idx);
    for row in dists.iter_mut() {
        row.remove(idx);
    }
    active.remove(idx);
}

fn push_cluster(dists: &mut Vec<Vec<f64>>, active: &mut Vec<NodeId>, id: NodeId, mut row: Vec<f64>) {
    for (existing, &d) in dists.iter_mut().zip(&row) {
        existing.push(d);
    }
    row.push(0.0);
    dists.push(row);
    active.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(names: &[&str], values: &[(usize, usize, f64)]) -> DistanceMatrix {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let mut m = DistanceMatrix::new(&names).unwrap();
        for &(i, j, d) in values {
            m.set(i, j, d);
        }
        m
    }

    fn parent_of(tree: &Tree, name: &str) -> NodeId {
        let id = tree.get_node_by_name(name).unwrap();
        tree.get_node(id).unwrap().parent.unwrap()
    }

    #[test]
    fn test_upgma_simple() {
        //   A B C
        // A 0 2 4
        // B 2 0 4
        // C 4 4 0
        let mat = matrix(&["A", "B", "C"], &[(0, 1, 2.0), (0, 2, 4.0), (1, 2, 4.0)]);
        let tree = upgma(&mat).unwrap();

        let root = tree.get_root().unwrap();
        let children = &tree.get_node(root).unwrap().children;
        assert_eq!(children.len(), 2);

        let ab = parent_of(&tree, "A");
        assert_eq!(ab, parent_of(&tree, "B"));
        assert_ne!(ab, root);
        assert_eq!(parent_of(&tree, "C"), root);

        let c_node = tree.get_node(tree.get_node_by_name("C").unwrap()).unwrap();
        assert_relative_eq!(c_node.length.unwrap(), 2.0);
        assert_relative_eq!(tree.get_node(ab).unwrap().length.unwrap(), 1.0);
        for &grandchild in &tree.get_node(ab).unwrap().children {
            assert_relative_eq!(tree.get_node(grandchild).unwrap().length.unwrap(), 1.0);
        }
    }

    #[test]
    fn test_upgma_small() {
        let tree = upgma(&matrix(&[], &[])).unwrap();
        assert_eq!(tree.get_root(), None);

        let tree = upgma(&matrix(&["A"], &[])).unwrap();
        assert_eq!(tree.to_newick(), "A;");
    }

    #[test]
    fn test_nj_insufficient() {
        let err = nj(&matrix(&["A"], &[])).unwrap_err();
        assert_eq!(err, ProtreeError::InsufficientInput { needed: 2, got: 1 });
    }

    #[test]
    fn test_nj_two_leaves() {
        let tree = nj(&matrix(&["A", "B"], &[(0, 1, 0.42)])).unwrap();
        let branches = tree.branches();
        assert_eq!(branches.len(), 1);
        assert_relative_eq!(branches[0].length, 0.42);
        assert_eq!(tree.to_newick(), "(A:0.21,B:0.21);");
    }

    #[test]
    fn test_nj_three_leaves() {
        let mat = matrix(
            &["1", "2", "3"],
            &[(0, 1, 0.1), (0, 2, 0.3), (1, 2, 0.3)],
        );
        let tree = nj(&mat).unwrap();

        // 1 and 2 are the closer pair
        assert_eq!(parent_of(&tree, "1"), parent_of(&tree, "2"));
        assert_ne!(parent_of(&tree, "1"), parent_of(&tree, "3"));

        let len = |name: &str| {
            let id = tree.get_node_by_name(name).unwrap();
            tree.get_node(id).unwrap().length.unwrap()
        };
        assert_relative_eq!(len("1"), 0.05);
        assert_relative_eq!(len("2"), 0.05);

        // Unrooted: the path 1 -> 3 sums to d(1,3)
        let total: f64 = tree.branches().iter().map(|b| b.length).sum();
        assert_relative_eq!(total, 0.05 + 0.05 + 0.25);
    }

    #[test]
    fn test_nj_additive() {
        // Additive tree ((A:2,B:3):1,(C:4,D:5))
        let mat = matrix(
            &["A", "B", "C", "D"],
            &[
                (0, 1, 5.0),
                (0, 2, 7.0),
                (0, 3, 8.0),
                (1, 2, 8.0),
                (1, 3, 9.0),
                (2, 3, 9.0),
            ],
        );
        let tree = nj(&mat).unwrap();
        assert_eq!(parent_of(&tree, "A"), parent_of(&tree, "B"));

        let len = |name: &str| {
            let id = tree.get_node_by_name(name).unwrap();
            tree.branches()
                .iter()
                .find(|b| b.lower == id || b.upper == id)
                .map(|b| b.length)
                .unwrap()
        };
        assert_relative_eq!(len("A"), 2.0, epsilon = 1e-9);
        assert_relative_eq!(len("B"), 3.0, epsilon = 1e-9);
        assert_relative_eq!(len("C"), 4.0, epsilon = 1e-9);
        assert_relative_eq!(len("D"), 5.0, epsilon = 1e-9);

        let total: f64 = tree.branches().iter().map(|b| b.length).sum();
        assert_relative_eq!(total, 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nj_clamps_negative() {
        // Non-additive input that drives one branch below zero
        let mat = matrix(
            &["A", "B", "C", "D"],
            &[
                (0, 1, 0.1),
                (0, 2, 1.0),
                (0, 3, 1.0),
                (1, 2, 3.0),
                (1, 3, 3.0),
                (2, 3, 0.1),
            ],
        );
        let tree = nj(&mat).unwrap();
        for branch in tree.branches() {
            assert!(branch.length >= 0.0);
        }
        assert_eq!(tree.get_leaves().len(), 4);
    }
}
