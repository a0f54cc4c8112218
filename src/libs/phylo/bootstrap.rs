use crate::libs::align::msa::MultipleAlignment;
use crate::libs::error::{ProtreeError, Result};
use crate::libs::phylo::build::nj;
use crate::libs::phylo::distance::{distance_matrix_with, DistanceModel};
use crate::libs::phylo::tree::support::{bipartitions, node_bitsets, split_set, Bipartition, LeafMap};
use crate::libs::phylo::tree::Tree;
use crate::libs::pool::{default_parallelism, run_indexed, CancelToken};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Draws per replicate before a resample with an all-gap row is accepted anyway.
const MAX_REDRAWS: usize = 100;

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub replicates: usize,
    /// Replicate `k` draws from an RNG seeded with `seed + k`.
    pub seed: u64,
    pub parallel: usize,
    pub model: DistanceModel,
    pub cancel: CancelToken,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            replicates: 100,
            seed: 42,
            parallel: default_parallelism(),
            model: DistanceModel::default(),
            cancel: CancelToken::new(),
        }
    }
}

/// How often each bipartition appeared among the replicate trees.
#[derive(Debug, Clone)]
pub struct BootstrapSupport {
    pub counts: HashMap<Bipartition, usize>,
    pub replicates: usize,
    pub leaf_map: LeafMap,
}

impl BootstrapSupport {
    pub fn count(&self, split: &Bipartition) -> usize {
        self.counts.get(split).copied().unwrap_or(0)
    }

    /// `100 * count / replicates`; 0 for a split no replicate produced.
    pub fn support_percent(&self, split: &Bipartition) -> f64 {
        if self.replicates == 0 {
            return 0.0;
        }
        100.0 * self.count(split) as f64 / self.replicates as f64
    }

    /// Label every internal branch of `tree` with its support.
    ///
    /// Below a bifurcating root both children stand for the same branch and
    /// get the same value. The root itself is left unlabelled.
    pub fn annotate(&self, tree: &mut Tree) -> Result<()> {
        let root = match tree.get_root() {
            Some(root) => root,
            None => return Ok(()),
        };
        let bitsets = node_bitsets(tree, &self.leaf_map)?;
        let internal: Vec<_> = tree
            .preorder(root)
            .into_iter()
            .filter(|&id| id != root && tree.get_node(id).is_some_and(|n| !n.is_leaf()))
            .collect();

        for id in internal {
            let bits = match bitsets.get(&id) {
                Some(bits) => bits.clone(),
                None => continue,
            };
            let split = Bipartition::new(bits);
            let support = if split.is_trivial() {
                None
            } else {
                Some(self.support_percent(&split))
            };
            if let Some(node) = tree.get_node_mut(id) {
                node.support = support;
            }
        }
        Ok(())
    }
}

/// Columns drawn uniformly with replacement, as many as the source has.
pub fn resample_columns<R: Rng>(rng: &mut R, num_columns: usize) -> Vec<usize> {
    (0..num_columns)
        .map(|_| rng.gen_range(0..num_columns))
        .collect()
}

fn replicate_alignment(msa: &MultipleAlignment, seed: u64) -> MultipleAlignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut attempt = 0;
    loop {
        let columns = resample_columns(&mut rng, msa.num_columns());
        let replicate = msa.select_columns(&columns);
        attempt += 1;
        if replicate.every_row_has_residues() || attempt >= MAX_REDRAWS {
            return replicate;
        }
        warn!("Replicate with seed {} has an all-gap row, redrawing", seed);
    }
}

/// Resample alignment columns, rebuild an NJ tree per replicate and count the
/// bipartitions those trees contain.
///
/// Replicates run on a worker pool; each one is seeded independently, so the
/// counts do not depend on scheduling.
pub fn bootstrap_support(msa: &MultipleAlignment, opts: &BootstrapOptions) -> Result<BootstrapSupport> {
    if opts.replicates == 0 {
        return Err(ProtreeError::InvalidParameter(
            "number of bootstrap replicates must be positive".to_string(),
        ));
    }
    if msa.num_rows() < 2 {
        return Err(ProtreeError::InsufficientInput {
            needed: 2,
            got: msa.num_rows(),
        });
    }
    if msa.num_columns() == 0 {
        return Err(ProtreeError::InvalidParameter(
            "alignment has no columns".to_string(),
        ));
    }

    let leaf_map = LeafMap::from_names(msa.ids())?;
    let model = opts.model;
    let seeds: Vec<u64> = (0..opts.replicates as u64)
        .map(|k| opts.seed.wrapping_add(k))
        .collect();

    let replicate_splits = run_indexed(seeds, opts.parallel, &opts.cancel, |seed| {
        let replicate = replicate_alignment(msa, seed);
        let matrix = distance_matrix_with(&replicate, model)?;
        let tree = nj(&matrix)?;
        split_set(&tree, &leaf_map)
    })?;

    // Single merge point
    let mut counts: HashMap<Bipartition, usize> = HashMap::new();
    for splits in replicate_splits {
        for split in splits {
            *counts.entry(split).or_insert(0) += 1;
        }
    }
    debug!(
        "{} replicates, {} distinct bipartitions",
        opts.replicates,
        counts.len()
    );

    Ok(BootstrapSupport {
        counts,
        replicates: opts.replicates,
        leaf_map,
    })
}

/// Support of every non-trivial branch of `tree`, in preorder.
pub fn branch_support(tree: &Tree, support: &BootstrapSupport) -> Result<Vec<(Bipartition, f64)>> {
    Ok(bipartitions(tree, &support.leaf_map)?
        .into_iter()
        .map(|(_, split)| {
            let value = support.support_percent(&split);
            (split, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::distance::distance_matrix;

    fn sample_msa() -> MultipleAlignment {
        MultipleAlignment::new(
            vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
            vec![
                b"MKTAYIAKQRQISFVKSHFSRQ".to_vec(),
                b"MKTAYIAKQRQISFVKSHFSRE".to_vec(),
                b"MRTAWIAKQRHISFVKTHFSKE".to_vec(),
                b"MRTAWIGKQRHISFVKTHFSKE".to_vec(),
            ],
        )
        .unwrap()
    }

    fn opts(replicates: usize) -> BootstrapOptions {
        BootstrapOptions {
            replicates,
            seed: 7,
            parallel: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_resample_columns() {
        let mut rng = StdRng::seed_from_u64(1);
        let cols = resample_columns(&mut rng, 50);
        assert_eq!(cols.len(), 50);
        assert!(cols.iter().all(|&c| c < 50));

        let mut rng2 = StdRng::seed_from_u64(1);
        assert_eq!(resample_columns(&mut rng2, 50), cols);
    }

    #[test]
    fn test_bootstrap_errors() {
        let msa = sample_msa();
        assert!(matches!(
            bootstrap_support(&msa, &opts(0)),
            Err(ProtreeError::InvalidParameter(_))
        ));

        let single = MultipleAlignment::new(vec!["a".to_string()], vec![b"MK".to_vec()]).unwrap();
        assert!(matches!(
            bootstrap_support(&single, &opts(10)),
            Err(ProtreeError::InsufficientInput { .. })
        ));

        let empty = MultipleAlignment::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![], vec![]],
        )
        .unwrap();
        assert!(matches!(
            bootstrap_support(&empty, &opts(10)),
            Err(ProtreeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bootstrap_support() {
        let msa = sample_msa();
        let support = bootstrap_support(&msa, &opts(50)).unwrap();
        assert_eq!(support.replicates, 50);

        let mut tree = nj(&distance_matrix(&msa).unwrap()).unwrap();
        support.annotate(&mut tree).unwrap();

        let values = branch_support(&tree, &support).unwrap();
        // One internal split for four leaves: ab|cd
        assert_eq!(values.len(), 1);
        for (_, value) in &values {
            assert!((0.0..=100.0).contains(value));
        }
        // Strongly supported by the data
        assert!(values[0].1 >= 80.0);

        let root = tree.get_root().unwrap();
        assert_eq!(tree.get_node(root).unwrap().support, None);
        let labelled = tree
            .preorder(root)
            .into_iter()
            .filter(|&id| tree.get_node(id).unwrap().support.is_some())
            .count();
        assert!(labelled >= 1);
    }

    #[test]
    fn test_bootstrap_deterministic() {
        let msa = sample_msa();
        let first = bootstrap_support(&msa, &opts(20)).unwrap();
        let mut serial = opts(20);
        serial.parallel = 1;
        let second = bootstrap_support(&msa, &serial).unwrap();
        assert_eq!(first.counts, second.counts);
    }

    #[test]
    fn test_bootstrap_cancelled() {
        let msa = sample_msa();
        let o = opts(20);
        o.cancel.cancel();
        assert_eq!(
            bootstrap_support(&msa, &o).unwrap_err(),
            ProtreeError::Cancelled
        );
    }

    #[test]
    fn test_support_percent_unknown_split() {
        let msa = sample_msa();
        let support = bootstrap_support(&msa, &opts(5)).unwrap();
        let mut side = fixedbitset::FixedBitSet::with_capacity(4);
        side.insert(0);
        side.insert(2);
        let split = Bipartition::new(side);
        let value = support.support_percent(&split);
        assert!((0.0..=100.0).contains(&value));
        assert_eq!(support.count(&split) as f64 * 100.0 / 5.0, value);
    }
}
