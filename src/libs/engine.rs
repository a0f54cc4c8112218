//! Entry points of the two workflows: similarity search and tree reconstruction.
use crate::libs::align::identity::{rank, top_n, RankedHit};
use crate::libs::align::local::{self, AlignmentResult};
use crate::libs::align::msa::{align_many, MultipleAlignment};
use crate::libs::error::{ProtreeError, Result};
use crate::libs::phylo::bootstrap::{bootstrap_support, BootstrapOptions, BootstrapSupport};
use crate::libs::phylo::build::nj;
use crate::libs::phylo::distance::{distance_matrix_with, DistanceMatrix, DistanceModel};
use crate::libs::phylo::tree::Tree;
use crate::libs::pool::{default_parallelism, run_indexed, CancelToken};
use crate::libs::scoring::ScoringMatrix;
use crate::libs::seq::Sequence;
use log::{debug, info};

/// Local alignment of two sequences after checking the scoring parameters.
pub fn align(query: &Sequence, target: &Sequence, scoring: &ScoringMatrix) -> Result<AlignmentResult> {
    scoring.validate()?;
    local::align(query, target, scoring)
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub scoring: ScoringMatrix,
    pub parallel: usize,
    pub cancel: CancelToken,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            scoring: ScoringMatrix::blosum62(),
            parallel: default_parallelism(),
            cancel: CancelToken::new(),
        }
    }
}

/// Align `query` against every target and keep the `top_n` best by identity.
///
/// Ties keep the order of `targets`. An empty list means no target shares a
/// single identical residue with the query.
pub fn find_similar(
    query: &Sequence,
    targets: &[Sequence],
    top_n_hits: usize,
    opts: &SearchOptions,
) -> Result<Vec<RankedHit>> {
    if top_n_hits == 0 {
        return Err(ProtreeError::InvalidParameter(
            "top-N must be positive".to_string(),
        ));
    }
    if targets.is_empty() {
        return Err(ProtreeError::EmptyInput("no target sequences".to_string()));
    }
    opts.scoring.validate()?;

    let scoring = &opts.scoring;
    let hits = run_indexed(
        targets.iter().collect(),
        opts.parallel,
        &opts.cancel,
        |target: &Sequence| {
            let aln = local::align(query, target, scoring)?;
            Ok(RankedHit::new(target.id(), &aln, target.len()))
        },
    )?;
    debug!("Aligned {} against {} targets", query.id(), hits.len());

    Ok(top_n(rank(hits), top_n_hits))
}

#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub scoring: ScoringMatrix,
    pub model: DistanceModel,
    pub seed: u64,
    pub parallel: usize,
    pub cancel: CancelToken,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            scoring: ScoringMatrix::blosum62(),
            model: DistanceModel::default(),
            seed: 42,
            parallel: default_parallelism(),
            cancel: CancelToken::new(),
        }
    }
}

/// Every intermediate product of a tree reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub msa: MultipleAlignment,
    pub distances: DistanceMatrix,
    pub tree: Tree,
    pub support: Option<BootstrapSupport>,
}

/// Multiple alignment, distances and an NJ tree, with bootstrap support on
/// the internal branches when `num_bootstraps > 0`.
pub fn build_tree(seqs: &[Sequence], num_bootstraps: usize, opts: &TreeOptions) -> Result<Tree> {
    Ok(reconstruct(seqs, num_bootstraps, opts)?.tree)
}

pub fn reconstruct(seqs: &[Sequence], num_bootstraps: usize, opts: &TreeOptions) -> Result<Reconstruction> {
    if seqs.len() < 2 {
        return Err(ProtreeError::InsufficientInput {
            needed: 2,
            got: seqs.len(),
        });
    }
    if opts.cancel.is_cancelled() {
        return Err(ProtreeError::Cancelled);
    }

    let msa = align_many(seqs, &opts.scoring)?;
    info!(
        "Aligned {} sequences into {} columns",
        msa.num_rows(),
        msa.num_columns()
    );
    tree_from_alignment(msa, num_bootstraps, opts)
}

/// The tree half of [`reconstruct`], for an alignment built elsewhere.
pub fn tree_from_alignment(
    msa: MultipleAlignment,
    num_bootstraps: usize,
    opts: &TreeOptions,
) -> Result<Reconstruction> {
    if opts.cancel.is_cancelled() {
        return Err(ProtreeError::Cancelled);
    }
    let distances = distance_matrix_with(&msa, opts.model)?;
    let mut tree = nj(&distances)?;

    let support = if num_bootstraps > 0 {
        let boot_opts = BootstrapOptions {
            replicates: num_bootstraps,
            seed: opts.seed,
            parallel: opts.parallel,
            model: opts.model,
            cancel: opts.cancel.clone(),
        };
        let support = bootstrap_support(&msa, &boot_opts)?;
        support.annotate(&mut tree)?;
        info!("Attached support from {} replicates", num_bootstraps);
        Some(support)
    } else {
        None
    };

    Ok(Reconstruction {
        msa,
        distances,
        tree,
        support,
    })
}
