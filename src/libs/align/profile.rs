//! Profile-vs-profile global alignment for progressive multiple alignment.
use crate::libs::scoring::ScoringMatrix;
use crate::libs::seq::{is_gap, GAP};

/// A group of already aligned rows.
///
/// `members[k]` is the input index of `rows[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    members: Vec<usize>,
    rows: Vec<Vec<u8>>,
}

// Residue counts of one column
struct Column {
    counts: Vec<(u8, f64)>,
    residues: f64,
}

impl Column {
    fn summarize(rows: &[Vec<u8>], col: usize) -> Self {
        let mut counts: Vec<(u8, f64)> = Vec::new();
        let mut residues = 0.0;
        for row in rows {
            let b = row[col];
            if is_gap(b) {
                continue;
            }
            residues += 1.0;
            match counts.iter_mut().find(|(r, _)| *r == b) {
                Some((_, c)) => *c += 1.0,
                None => counts.push((b, 1.0)),
            }
        }
        Self { counts, residues }
    }

    /// Mean substitution score over all residue pairs across the two columns.
    fn score(&self, other: &Column, scoring: &ScoringMatrix) -> f64 {
        if self.residues == 0.0 || other.residues == 0.0 {
            return 0.0;
        }
        let mut total = 0.0;
        for &(a, ca) in &self.counts {
            for &(b, cb) in &other.counts {
                total += ca * cb * scoring.get_score(a, b) as f64;
            }
        }
        total / (self.residues * other.residues)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Trace {
    Diag,
    Up,
    Left,
}

impl Profile {
    /// A single-row profile.
    pub fn from_sequence(index: usize, residues: &[u8]) -> Self {
        Self {
            members: vec![index],
            rows: vec![residues.to_vec()],
        }
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    /// Rows sorted by input index.
    pub fn into_ordered_rows(self) -> Vec<(usize, Vec<u8>)> {
        let mut pairs: Vec<(usize, Vec<u8>)> = self.members.into_iter().zip(self.rows).collect();
        pairs.sort_by_key(|(idx, _)| *idx);
        pairs
    }

    fn columns(&self) -> Vec<Column> {
        (0..self.width())
            .map(|c| Column::summarize(&self.rows, c))
            .collect()
    }

    /// Globally align two profiles with affine gaps and merge them.
    ///
    /// End gaps cost the same as inner gaps. A gap column is inserted across
    /// every row of a profile, so gaps already present are never removed.
    /// Returns the merged profile and the alignment score.
    pub fn align(&self, other: &Profile, scoring: &ScoringMatrix) -> (Profile, f64) {
        let cols_a = self.columns();
        let cols_b = other.columns();
        let n = cols_a.len();
        let m = cols_b.len();
        let width = m + 1;
        let go = scoring.gap_open as f64;
        let ge = scoring.gap_extend as f64;
        let neg = f64::NEG_INFINITY;

        // diag: column pair; up: column of `self` against gaps; left: column of `other` against gaps
        let mut diag = vec![neg; (n + 1) * width];
        let mut up = vec![neg; (n + 1) * width];
        let mut left = vec![neg; (n + 1) * width];
        let mut tr_diag = vec![Trace::Diag; (n + 1) * width];
        let mut tr_up = vec![Trace::Up; (n + 1) * width];
        let mut tr_left = vec![Trace::Left; (n + 1) * width];

        diag[0] = 0.0;
        for i in 1..=n {
            let cur = i * width;
            up[cur] = -go - (i - 1) as f64 * ge;
            tr_up[cur] = if i == 1 { Trace::Diag } else { Trace::Up };
        }
        for j in 1..=m {
            left[j] = -go - (j - 1) as f64 * ge;
            tr_left[j] = if j == 1 { Trace::Diag } else { Trace::Left };
        }

        for i in 1..=n {
            for j in 1..=m {
                let cur = i * width + j;

                let prev = cur - width - 1;
                let (best, from) = pick(diag[prev], up[prev], left[prev]);
                diag[cur] = best + cols_a[i - 1].score(&cols_b[j - 1], scoring);
                tr_diag[cur] = from;

                let prev = cur - width;
                let (best, from) = pick(diag[prev] - go, up[prev] - ge, left[prev] - go);
                up[cur] = best;
                tr_up[cur] = from;

                let prev = cur - 1;
                let (best, from) = pick(diag[prev] - go, up[prev] - go, left[prev] - ge);
                left[cur] = best;
                tr_left[cur] = from;
            }
        }

        let end = n * width + m;
        let (score, mut state) = pick(diag[end], up[end], left[end]);

        // Column pairs, None for a gap column, from the end backwards
        let mut path: Vec<(Option<usize>, Option<usize>)> = Vec::with_capacity(n + m);
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            let cur = i * width + j;
            match state {
                Trace::Diag => {
                    state = tr_diag[cur];
                    path.push((Some(i - 1), Some(j - 1)));
                    i -= 1;
                    j -= 1;
                }
                Trace::Up => {
                    state = tr_up[cur];
                    path.push((Some(i - 1), None));
                    i -= 1;
                }
                Trace::Left => {
                    state = tr_left[cur];
                    path.push((None, Some(j - 1)));
                    j -= 1;
                }
            }
        }
        path.reverse();

        let mut rows: Vec<Vec<u8>> = Vec::with_capacity(self.len() + other.len());
        for row in &self.rows {
            rows.push(
                path.iter()
                    .map(|(a, _)| a.map_or(GAP, |c| row[c]))
                    .collect(),
            );
        }
        for row in &other.rows {
            rows.push(
                path.iter()
                    .map(|(_, b)| b.map_or(GAP, |c| row[c]))
                    .collect(),
            );
        }

        let mut members = self.members.clone();
        members.extend_from_slice(&other.members);

        (Profile { members, rows }, score)
    }
}

// Highest of the three with ties going diag, then up, then left
fn pick(diag: f64, up: f64, left: f64) -> (f64, Trace) {
    let mut best = (diag, Trace::Diag);
    if up > best.0 {
        best = (up, Trace::Up);
    }
    if left > best.0 {
        best = (left, Trace::Left);
    }
    best
}
