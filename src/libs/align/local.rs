//! Smith-Waterman local alignment with affine gaps.
use crate::libs::error::{ProtreeError, Result};
use crate::libs::scoring::ScoringMatrix;
use crate::libs::seq::{Sequence, GAP};

/// An optimal local alignment between a query and a target.
///
/// Both rows have the same length and no column is a gap in both rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentResult {
    pub aligned_query: Vec<u8>,
    pub aligned_target: Vec<u8>,
    pub score: i32,
    /// Half-open range of the query covered by the alignment (0-based).
    pub query_range: (usize, usize),
    /// Half-open range of the target covered by the alignment (0-based).
    pub target_range: (usize, usize),
}

impl AlignmentResult {
    /// Number of alignment columns.
    pub fn len(&self) -> usize {
        self.aligned_query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_query.is_empty()
    }

    /// CIGAR-like summary: `M` aligned pair, `I` residue only in the query,
    /// `D` residue only in the target.
    pub fn cigar(&self) -> String {
        let mut ops: Vec<(char, usize)> = Vec::new();
        for (&q, &t) in self.aligned_query.iter().zip(self.aligned_target.iter()) {
            let op = if q == GAP {
                'D'
            } else if t == GAP {
                'I'
            } else {
                'M'
            };
            match ops.last_mut() {
                Some(last) if last.0 == op => last.1 += 1,
                _ => ops.push((op, 1)),
            }
        }
        ops.into_iter()
            .map(|(op, len)| format!("{}{}", len, op))
            .collect()
    }

    /// The same alignment seen from the target's side.
    pub fn swapped(&self) -> AlignmentResult {
        AlignmentResult {
            aligned_query: self.aligned_target.clone(),
            aligned_target: self.aligned_query.clone(),
            score: self.score,
            query_range: self.target_range,
            target_range: self.query_range,
        }
    }
}

// Far enough from i32::MIN that subtracting gap costs cannot wrap
const NEG_INF: i32 = i32::MIN / 4;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    Up,
    Left,
}

/// Align `query` against `target` with Smith-Waterman and affine gaps.
///
/// Three matrices are filled: `h` (best score ending at a cell), `up`
/// (ending in a gap in the target row, query residue consumed) and `left`
/// (ending in a gap in the query row, target residue consumed):
///
/// ```text
/// up[i,j]   = max(h[i-1,j] - gap_open, up[i-1,j] - gap_extend)
/// left[i,j] = max(h[i,j-1] - gap_open, left[i,j-1] - gap_extend)
/// h[i,j]    = max(0, h[i-1,j-1] + sub(q[i],t[j]), up[i,j], left[i,j])
/// ```
///
/// Traceback starts at the first maximal cell in row-major order and stops
/// at the first cell whose value is 0. Ties prefer diagonal, then up, then left.
///
/// The pair is always aligned in one canonical orientation (shorter sequence
/// first, then the lexically smaller), so `align(a, b)` and `align(b, a)`
/// pick the same alignment among co-optimal ones, seen from either side.
///
/// ```
/// use protree::libs::align::local::align;
/// use protree::libs::scoring::ScoringMatrix;
/// use protree::libs::seq::Sequence;
///
/// let q = Sequence::new("q", b"MKT");
/// let t = Sequence::new("t", b"MKT");
/// let aln = align(&q, &t, &ScoringMatrix::blosum62()).unwrap();
/// assert_eq!(aln.score, 15);
/// ```
pub fn align(query: &Sequence, target: &Sequence, scoring: &ScoringMatrix) -> Result<AlignmentResult> {
    if query.is_empty() {
        return Err(ProtreeError::EmptyInput(format!(
            "query sequence '{}' has no residues",
            query.id()
        )));
    }
    if target.is_empty() {
        return Err(ProtreeError::EmptyInput(format!(
            "target sequence '{}' has no residues",
            target.id()
        )));
    }

    Ok(align_residues(query.residues(), target.residues(), scoring))
}

/// The dynamic program behind [`align`], on raw residue slices.
pub fn align_residues(q: &[u8], t: &[u8], scoring: &ScoringMatrix) -> AlignmentResult {
    if (t.len(), t) < (q.len(), q) {
        smith_waterman(t, q, scoring).swapped()
    } else {
        smith_waterman(q, t, scoring)
    }
}

fn smith_waterman(q: &[u8], t: &[u8], scoring: &ScoringMatrix) -> AlignmentResult {
    let n = q.len();
    let m = t.len();
    let width = m + 1;
    let go = scoring.gap_open;
    let ge = scoring.gap_extend;

    let mut h = vec![0i32; (n + 1) * width];
    let mut up = vec![NEG_INF; (n + 1) * width];
    let mut left = vec![NEG_INF; (n + 1) * width];

    let mut best = 0i32;
    let mut best_cell = (0usize, 0usize);

    for i in 1..=n {
        let qi = q[i - 1];
        for j in 1..=m {
            let cur = i * width + j;

            up[cur] = (h[cur - width] - go).max(up[cur - width] - ge);
            left[cur] = (h[cur - 1] - go).max(left[cur - 1] - ge);

            let diag = h[cur - width - 1] + scoring.get_score(qi, t[j - 1]);
            let score = diag.max(up[cur]).max(left[cur]).max(0);
            h[cur] = score;

            if score > best {
                best = score;
                best_cell = (i, j);
            }
        }
    }

    if best == 0 {
        return AlignmentResult::default();
    }

    let (mut i, mut j) = best_cell;
    let mut state = State::Match;
    let mut aln_q = Vec::new();
    let mut aln_t = Vec::new();

    loop {
        let cur = i * width + j;
        match state {
            State::Match => {
                if i == 0 || j == 0 || h[cur] == 0 {
                    break;
                }
                let diag = h[cur - width - 1] + scoring.get_score(q[i - 1], t[j - 1]);
                if h[cur] == diag {
                    aln_q.push(q[i - 1]);
                    aln_t.push(t[j - 1]);
                    i -= 1;
                    j -= 1;
                } else if h[cur] == up[cur] {
                    state = State::Up;
                } else {
                    state = State::Left;
                }
            }
            State::Up => {
                aln_q.push(q[i - 1]);
                aln_t.push(GAP);
                // Prefer the gap opening over a further extension
                if up[cur] == h[cur - width] - go {
                    state = State::Match;
                }
                i -= 1;
            }
            State::Left => {
                aln_q.push(GAP);
                aln_t.push(t[j - 1]);
                if left[cur] == h[cur - 1] - go {
                    state = State::Match;
                }
                j -= 1;
            }
        }
    }

    aln_q.reverse();
    aln_t.reverse();

    AlignmentResult {
        aligned_query: aln_q,
        aligned_target: aln_t,
        score: best,
        query_range: (i, best_cell.0),
        target_range: (j, best_cell.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::align::identity::percent_identity;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn seq(s: &str) -> Sequence {
        Sequence::new(s, s.as_bytes())
    }

    #[test]
    fn test_identical() {
        let m = ScoringMatrix::blosum62();
        let aln = align(&seq("MKT"), &seq("MKT"), &m).unwrap();
        assert_eq!(aln.score, 15);
        assert_eq!(aln.aligned_query, b"MKT");
        assert_eq!(aln.aligned_target, b"MKT");
        assert_eq!(aln.query_range, (0, 3));
        assert_eq!(aln.target_range, (0, 3));
        assert_eq!(aln.cigar(), "3M");
    }

    #[test]
    fn test_self_score_is_diagonal_sum() {
        let m = ScoringMatrix::blosum62();
        for s in ["ACDEFGHIKLMNPQRSTVWY", "WWPPCC", "HEAGAWGHEE"] {
            let expected: i32 = s.bytes().map(|b| m.get_score(b, b)).sum();
            let aln = align(&seq(s), &seq(s), &m).unwrap();
            assert_eq!(aln.score, expected, "{}", s);
            assert_eq!(aln.aligned_query, s.as_bytes());
        }
    }

    #[test]
    fn test_local_substring() {
        let m = ScoringMatrix::blosum62();
        let aln = align(&seq("GGGWWWHHHGGG"), &seq("WWWHHH"), &m).unwrap();
        assert_eq!(aln.aligned_query, b"WWWHHH");
        assert_eq!(aln.query_range, (3, 9));
        assert_eq!(aln.target_range, (0, 6));
        assert_eq!(aln.score, 3 * 11 + 3 * 8);
    }

    #[test]
    fn test_gap() {
        // One deleted residue in the middle of two strong blocks
        let m = ScoringMatrix::blosum62().with_gaps(5, 1);
        let aln = align(&seq("WWWWCWWWW"), &seq("WWWWWWWW"), &m).unwrap();
        assert_eq!(aln.aligned_query, b"WWWWCWWWW");
        assert_eq!(aln.aligned_target, b"WWWW-WWWW");
        assert_eq!(aln.score, 8 * 11 - 5);
        assert_eq!(aln.cigar(), "4M1I4M");

        let rev = align(&seq("WWWWWWWW"), &seq("WWWWCWWWW"), &m).unwrap();
        assert_eq!(rev.score, aln.score);
        assert_eq!(rev.cigar(), "4M1D4M");
    }

    #[test]
    fn test_no_positive_alignment() {
        let m = ScoringMatrix::identity(1, -1);
        let aln = align(&seq("AAAA"), &seq("CCCC"), &m).unwrap();
        assert_eq!(aln.score, 0);
        assert!(aln.is_empty());
    }

    #[test]
    fn test_rows_never_double_gap() {
        let m = ScoringMatrix::blosum62().with_gaps(4, 1);
        let aln = align(&seq("HEAGAWGHEE"), &seq("PAWHEAE"), &m).unwrap();
        assert_eq!(aln.aligned_query.len(), aln.aligned_target.len());
        for (a, b) in aln.aligned_query.iter().zip(aln.aligned_target.iter()) {
            assert!(!(*a == GAP && *b == GAP));
        }
        assert!(aln.score > 0);
    }

    #[test]
    fn test_empty_input() {
        let m = ScoringMatrix::blosum62();
        let empty = Sequence::new("e", b"");
        assert!(matches!(
            align(&empty, &seq("MKT"), &m),
            Err(ProtreeError::EmptyInput(_))
        ));
        assert!(matches!(
            align(&seq("MKT"), &empty, &m),
            Err(ProtreeError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_swapped_call_order() {
        let m = ScoringMatrix::blosum62().with_gaps(4, 1);
        let a = seq("ADAEAEE");
        let b = seq("AACCCAAAEDAEDCCAECDEDEDCCE");
        let ab = align(&a, &b, &m).unwrap();
        let ba = align(&b, &a, &m).unwrap();
        assert_eq!(ba, ab.swapped());
        assert_eq!(percent_identity(&ab), percent_identity(&ba));
    }

    #[test]
    fn test_identity_independent_of_order() {
        let m = ScoringMatrix::blosum62().with_gaps(4, 1);
        let alphabet = b"ACDE";
        let mut rng = StdRng::seed_from_u64(7);
        let random_seq = |rng: &mut StdRng| -> Vec<u8> {
            let len = rng.gen_range(1..30);
            (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect()
        };

        for k in 0..2000 {
            let a = Sequence::new("a", &random_seq(&mut rng));
            let b = Sequence::new("b", &random_seq(&mut rng));
            let ab = align(&a, &b, &m).unwrap();
            let ba = align(&b, &a, &m).unwrap();
            assert_eq!(ab.score, ba.score, "pair {}", k);
            assert_eq!(
                percent_identity(&ab),
                percent_identity(&ba),
                "pair {}: {:?} vs {:?}",
                k,
                a.residues(),
                b.residues()
            );
        }
    }
}
