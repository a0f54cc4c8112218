//! Progressive multiple sequence alignment.
use super::identity::percent_identity;
use super::local::align_residues;
use super::profile::Profile;
use crate::libs::error::{ProtreeError, Result};
use crate::libs::phylo::build::upgma;
use crate::libs::phylo::distance::DistanceMatrix;
use crate::libs::scoring::ScoringMatrix;
use crate::libs::seq::{is_gap, Sequence};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Rows of equal length, one per sequence id.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleAlignment {
    ids: Vec<String>,
    rows: Vec<Vec<u8>>,
}

impl MultipleAlignment {
    pub fn new(ids: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self> {
        if ids.len() != rows.len() {
            return Err(ProtreeError::InvalidParameter(format!(
                "{} ids for {} rows",
                ids.len(),
                rows.len()
            )));
        }
        check_unique(&ids)?;
        if let Some(first) = rows.first() {
            if let Some(k) = rows.iter().position(|r| r.len() != first.len()) {
                return Err(ProtreeError::InvalidParameter(format!(
                    "row {} has {} columns, expected {}",
                    ids[k],
                    rows[k].len(),
                    first.len()
                )));
            }
        }
        Ok(Self { ids, rows })
    }

    /// Take an existing alignment, such as an aligned FASTA file.
    pub fn from_sequences(seqs: &[Sequence]) -> Result<Self> {
        Self::new(
            seqs.iter().map(|s| s.id().to_string()).collect(),
            seqs.iter().map(|s| s.residues().to_vec()).collect(),
        )
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.rows[i]
    }

    pub fn column(&self, j: usize) -> Vec<u8> {
        self.rows.iter().map(|r| r[j]).collect()
    }

    /// A new alignment made of the given source columns, repeats allowed.
    pub fn select_columns(&self, columns: &[usize]) -> MultipleAlignment {
        MultipleAlignment {
            ids: self.ids.clone(),
            rows: self
                .rows
                .iter()
                .map(|r| columns.iter().map(|&c| r[c]).collect())
                .collect(),
        }
    }

    /// True when no row consists of gaps only.
    pub fn every_row_has_residues(&self) -> bool {
        self.rows.iter().all(|r| r.iter().any(|&b| !is_gap(b)))
    }
}

impl fmt::Display for MultipleAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, row) in self.ids.iter().zip(&self.rows) {
            writeln!(f, ">{}", id)?;
            writeln!(f, "{}", String::from_utf8_lossy(row))?;
        }
        Ok(())
    }
}

fn check_unique(ids: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ProtreeError::InvalidParameter(format!(
                "duplicate sequence id {}",
                id
            )));
        }
    }
    Ok(())
}

/// Guide-tree distances: `1 - identity` of each pairwise local alignment.
pub fn guide_distances(seqs: &[Sequence], scoring: &ScoringMatrix) -> Result<DistanceMatrix> {
    let ids: Vec<String> = seqs.iter().map(|s| s.id().to_string()).collect();
    let mut matrix = DistanceMatrix::new(&ids)?;

    let n = seqs.len();
    let pairs: Vec<(usize, usize)> = (0..n).tuple_combinations().collect();
    let dists: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let aln = align_residues(seqs[i].residues(), seqs[j].residues(), scoring);
            1.0 - percent_identity(&aln) / 100.0
        })
        .collect();

    for (&(i, j), d) in pairs.iter().zip(dists) {
        matrix.set(i, j, d);
    }
    Ok(matrix)
}

/// Progressive multiple alignment of unaligned sequences.
///
/// Sequences are clustered by average linkage on pairwise local-alignment
/// distances, then profiles are merged bottom-up along that guide tree.
/// Gap symbols in the input are removed first. Rows of the result follow
/// the input order.
pub fn align_many(seqs: &[Sequence], scoring: &ScoringMatrix) -> Result<MultipleAlignment> {
    if seqs.len() < 2 {
        return Err(ProtreeError::InsufficientInput {
            needed: 2,
            got: seqs.len(),
        });
    }
    scoring.validate()?;

    let seqs: Vec<Sequence> = seqs.iter().map(|s| s.ungapped()).collect();
    if let Some(empty) = seqs.iter().find(|s| s.is_empty()) {
        return Err(ProtreeError::EmptyInput(format!(
            "sequence '{}' has no residues",
            empty.id()
        )));
    }
    let ids: Vec<String> = seqs.iter().map(|s| s.id().to_string()).collect();
    check_unique(&ids)?;

    let distances = guide_distances(&seqs, scoring)?;
    debug!("Guide distances for {} sequences", seqs.len());
    let guide = upgma(&distances)?;

    let root = guide
        .get_root()
        .ok_or_else(|| ProtreeError::Tree("guide tree has no root".to_string()))?;

    // Leaf i of the guide tree is sequence i
    let mut profiles: Vec<Option<Profile>> = vec![None; guide.len()];
    for id in guide.postorder(root) {
        let node = guide
            .get_node(id)
            .ok_or_else(|| ProtreeError::Tree(format!("node {} not found", id)))?;
        if node.is_leaf() {
            profiles[id] = Some(Profile::from_sequence(id, seqs[id].residues()));
            continue;
        }

        let mut merged: Option<Profile> = None;
        for &child in &node.children {
            let profile = profiles[child]
                .take()
                .ok_or_else(|| ProtreeError::Tree(format!("node {} has no profile", child)))?;
            merged = Some(match merged {
                None => profile,
                Some(acc) => {
                    let (joined, score) = acc.align(&profile, scoring);
                    debug!(
                        "Merged {} + {} rows at node {} (score {:.1})",
                        acc.len(),
                        profile.len(),
                        id,
                        score
                    );
                    joined
                }
            });
        }
        profiles[id] = merged;
    }

    let profile = profiles[root]
        .take()
        .ok_or_else(|| ProtreeError::Tree("root has no profile".to_string()))?;
    let rows = profile
        .into_ordered_rows()
        .into_iter()
        .map(|(_, row)| row)
        .collect();

    MultipleAlignment::new(ids, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(list: &[(&str, &str)]) -> Vec<Sequence> {
        list.iter()
            .map(|(id, r)| Sequence::new(*id, r.as_bytes()))
            .collect()
    }

    #[test]
    fn test_multiple_alignment_new() {
        let msa = MultipleAlignment::new(
            vec!["a".to_string(), "b".to_string()],
            vec![b"MK-T".to_vec(), b"MKAT".to_vec()],
        )
        .unwrap();
        assert_eq!(msa.num_rows(), 2);
        assert_eq!(msa.num_columns(), 4);
        assert_eq!(msa.column(2), b"-A".to_vec());
        assert_eq!(msa.to_string(), ">a\nMK-T\n>b\nMKAT\n");

        let picked = msa.select_columns(&[3, 3, 0]);
        assert_eq!(picked.row(0), b"TTM");
        assert_eq!(picked.ids(), msa.ids());

        assert!(MultipleAlignment::new(
            vec!["a".to_string(), "b".to_string()],
            vec![b"MK".to_vec(), b"M".to_vec()],
        )
        .is_err());
        assert!(MultipleAlignment::new(
            vec!["a".to_string(), "a".to_string()],
            vec![b"M".to_vec(), b"M".to_vec()],
        )
        .is_err());
        assert!(MultipleAlignment::new(vec!["a".to_string()], vec![]).is_err());
    }

    #[test]
    fn test_every_row_has_residues() {
        let msa = MultipleAlignment::new(
            vec!["a".to_string(), "b".to_string()],
            vec![b"M-".to_vec(), b"-K".to_vec()],
        )
        .unwrap();
        assert!(msa.every_row_has_residues());
        assert!(!msa.select_columns(&[1, 1]).every_row_has_residues());
    }

    #[test]
    fn test_align_many_insufficient() {
        let scoring = ScoringMatrix::blosum62();
        let err = align_many(&seqs(&[("a", "MKT")]), &scoring).unwrap_err();
        assert_eq!(err, ProtreeError::InsufficientInput { needed: 2, got: 1 });

        let err = align_many(&seqs(&[("a", "MKT"), ("b", "--")]), &scoring).unwrap_err();
        assert!(matches!(err, ProtreeError::EmptyInput(_)));

        let err = align_many(&seqs(&[("a", "MKT"), ("a", "MKT")]), &scoring).unwrap_err();
        assert!(matches!(err, ProtreeError::InvalidParameter(_)));
    }

    #[test]
    fn test_align_many() {
        let scoring = ScoringMatrix::blosum62();
        let input = seqs(&[
            ("s1", "MKTAYIAKQRQISFVKSHFSRQ"),
            ("s2", "MKTAYIAKQRQISFVKSHFSRQ"),
            ("s3", "MKTAYAKQRQISFVKSHFSRQ"),
            ("s4", "MKTAYIAKQRQLSFVKSHFSRQ"),
        ]);
        let msa = align_many(&input, &scoring).unwrap();

        assert_eq!(msa.num_rows(), 4);
        assert_eq!(msa.ids(), &["s1", "s2", "s3", "s4"]);
        let width = msa.num_columns();
        assert!(width >= 22);
        for (row, seq) in msa.rows().iter().zip(&input) {
            assert_eq!(row.len(), width);
            let residues: Vec<u8> = row.iter().copied().filter(|&b| !is_gap(b)).collect();
            assert_eq!(residues, seq.residues());
        }
        assert_eq!(msa.row(0), msa.row(1));
        assert_eq!(msa.row(2).iter().filter(|&&b| is_gap(b)).count(), width - 21);
    }

    #[test]
    fn test_align_many_strips_gaps() {
        let scoring = ScoringMatrix::blosum62();
        let msa = align_many(&seqs(&[("a", "MK-T"), ("b", "MKT")]), &scoring).unwrap();
        assert_eq!(msa.row(0), b"MKT");
        assert_eq!(msa.row(1), b"MKT");
    }
}
