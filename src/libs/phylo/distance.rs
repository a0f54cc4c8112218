use crate::libs::align::msa::MultipleAlignment;
use crate::libs::error::{ProtreeError, Result};
use crate::libs::seq::is_gap;
use indexmap::IndexSet;
use log::warn;
use std::io::BufRead;

/// Distance returned when a correction is undefined for a divergent pair.
pub const SENTINEL_DISTANCE: f64 = 10.0;

/// Substitution-model correction applied to the observed mismatch fraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DistanceModel {
    /// `-ln(1 - p - p^2/5)`
    #[default]
    Jtt,
    /// `-ln(1 - p)`
    Poisson,
    /// The p-distance itself
    Raw,
}

impl DistanceModel {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "jtt" => Ok(DistanceModel::Jtt),
            "poisson" => Ok(DistanceModel::Poisson),
            "raw" | "p" => Ok(DistanceModel::Raw),
            _ => Err(ProtreeError::InvalidParameter(format!(
                "unknown distance model {}",
                name
            ))),
        }
    }

    /// Correct a mismatch fraction `p`.
    /// Falls back to [`SENTINEL_DISTANCE`] when the logarithm is undefined.
    pub fn correct(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        let arg = match self {
            DistanceModel::Jtt => 1.0 - p - p * p / 5.0,
            DistanceModel::Poisson => 1.0 - p,
            DistanceModel::Raw => return p,
        };
        if arg <= 0.0 {
            warn!(
                "Distance correction undefined for p = {:.4}, using {}",
                p, SENTINEL_DISTANCE
            );
            return SENTINEL_DISTANCE;
        }
        (-arg.ln()).min(SENTINEL_DISTANCE)
    }
}

/// Mismatch fraction over columns where at least one row has a residue.
///
/// A column is a match only when both rows hold the same residue.
/// Returns `None` when no column qualifies.
pub fn mismatch_fraction(row_a: &[u8], row_b: &[u8]) -> Option<f64> {
    let mut columns = 0usize;
    let mut identical = 0usize;
    for (&a, &b) in row_a.iter().zip(row_b) {
        let (ga, gb) = (is_gap(a), is_gap(b));
        if ga && gb {
            continue;
        }
        columns += 1;
        if !ga && !gb && a.eq_ignore_ascii_case(&b) {
            identical += 1;
        }
    }
    if columns == 0 {
        None
    } else {
        Some(1.0 - identical as f64 / columns as f64)
    }
}

/// JTT-corrected distance between two aligned rows.
pub fn pairwise_distance(row_a: &[u8], row_b: &[u8]) -> Result<f64> {
    pairwise_distance_with(row_a, row_b, DistanceModel::Jtt)
}

/// Distance between two aligned rows under `model`.
///
/// Rows with no shared column are as far apart as the sentinel.
pub fn pairwise_distance_with(row_a: &[u8], row_b: &[u8], model: DistanceModel) -> Result<f64> {
    if row_a.len() != row_b.len() {
        return Err(ProtreeError::InvalidParameter(format!(
            "rows differ in length: {} vs {}",
            row_a.len(),
            row_b.len()
        )));
    }
    match mismatch_fraction(row_a, row_b) {
        Some(p) => Ok(model.correct(p)),
        None => {
            warn!("No comparable columns, using {}", SENTINEL_DISTANCE);
            Ok(SENTINEL_DISTANCE)
        }
    }
}

/// JTT distance matrix over all row pairs of an alignment.
pub fn distance_matrix(msa: &MultipleAlignment) -> Result<DistanceMatrix> {
    distance_matrix_with(msa, DistanceModel::Jtt)
}

pub fn distance_matrix_with(msa: &MultipleAlignment, model: DistanceModel) -> Result<DistanceMatrix> {
    let mut matrix = DistanceMatrix::new(msa.ids())?;
    let n = msa.num_rows();
    for i in 0..n {
        for j in (i + 1)..n {
            let d = pairwise_distance_with(msa.row(i), msa.row(j), model)?;
            matrix.set(i, j, d);
        }
    }
    Ok(matrix)
}

/// Symmetric matrix of distances between named items, zero on the diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    names: IndexSet<String>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// An all-zero matrix. Names must be unique.
    pub fn new(names: &[String]) -> Result<Self> {
        let set: IndexSet<String> = names.iter().cloned().collect();
        if set.len() != names.len() {
            return Err(ProtreeError::InvalidParameter(
                "duplicate names in distance matrix".to_string(),
            ));
        }
        let n = set.len();
        Ok(Self {
            names: set,
            values: vec![0.0; n * n],
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn name(&self, i: usize) -> Option<&str> {
        self.names.get_index(i).map(|s| s.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.len() + j]
    }

    /// Set both `(i, j)` and `(j, i)`. The diagonal stays zero.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i == j {
            return;
        }
        let n = self.len();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }

    /// Relaxed PHYLIP square matrix: the count, then one tab-separated row per name.
    pub fn to_phylip(&self) -> String {
        let n = self.len();
        let mut out = format!("{}\n", n);
        for i in 0..n {
            out.push_str(&self.names[i]);
            for j in 0..n {
                out.push_str(&format!("\t{:.6}", self.get(i, j)));
            }
            out.push('\n');
        }
        out
    }

    /// Parse a relaxed PHYLIP square matrix.
    ///
    /// Names and values are separated by any whitespace. Off-diagonal cells
    /// are averaged with their mirror, so a slightly asymmetric input is accepted.
    pub fn from_phylip<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader
            .lines()
            .map_while(std::result::Result::ok)
            .filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| ProtreeError::EmptyInput("distance matrix".to_string()))?;
        let n: usize = header.trim().parse().map_err(|_| {
            ProtreeError::InvalidParameter(format!("bad PHYLIP header: {}", header.trim()))
        })?;

        let mut names = Vec::with_capacity(n);
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n);
        for line in lines.take(n) {
            let mut fields = line.split_whitespace();
            let name = fields.next().unwrap_or_default().to_string();
            let row = fields
                .map(|f| f.parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| ProtreeError::InvalidParameter(format!("bad row for {}", name)))?;
            if row.iter().any(|d| !d.is_finite()) {
                return Err(ProtreeError::InvalidParameter(format!(
                    "non-finite distance in row for {}",
                    name
                )));
            }
            if row.len() != n {
                return Err(ProtreeError::InvalidParameter(format!(
                    "row for {} has {} values, expected {}",
                    name,
                    row.len(),
                    n
                )));
            }
            names.push(name);
            rows.push(row);
        }
        if rows.len() != n {
            return Err(ProtreeError::InvalidParameter(format!(
                "expected {} rows, got {}",
                n,
                rows.len()
            )));
        }

        let mut matrix = Self::new(&names)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (rows[i][j] + rows[j][i]) / 2.0;
                if d < 0.0 {
                    return Err(ProtreeError::InvalidParameter(format!(
                        "negative distance between {} and {}",
                        names[i], names[j]
                    )));
                }
                matrix.set(i, j, d);
            }
        }
        Ok(matrix)
    }
}
