use super::local::AlignmentResult;
use crate::libs::seq::is_gap;
use std::cmp::Ordering;

/// A target ranked by similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    pub target_id: String,
    /// Percent identity in `[0, 100]`.
    pub identity_percent: f64,
    pub score: i32,
    /// Number of alignment columns.
    pub aligned_length: usize,
    /// Length of the whole target sequence.
    pub target_length: usize,
}

impl RankedHit {
    pub fn new(target_id: &str, alignment: &AlignmentResult, target_length: usize) -> Self {
        Self {
            target_id: target_id.to_string(),
            identity_percent: percent_identity(alignment),
            score: alignment.score,
            aligned_length: alignment.len(),
            target_length,
        }
    }

    /// Percentage of the target covered by the local alignment.
    pub fn coverage_percent(&self, alignment: &AlignmentResult) -> f64 {
        if self.target_length == 0 {
            return 0.0;
        }
        let (start, end) = alignment.target_range;
        (end - start) as f64 * 100.0 / self.target_length as f64
    }
}

/// Percent identity of an alignment.
///
/// Columns holding a gap in either row are left out entirely; the result is
/// identical columns over the remaining gap-free columns, times 100.
/// An alignment with no gap-free column has identity 0.
pub fn percent_identity(alignment: &AlignmentResult) -> f64 {
    let (ident, cols) = alignment
        .aligned_query
        .iter()
        .zip(alignment.aligned_target.iter())
        .filter(|(q, t)| !is_gap(**q) && !is_gap(**t))
        .fold((0usize, 0usize), |(ident, cols), (&q, &t)| {
            if q.eq_ignore_ascii_case(&t) {
                (ident + 1, cols + 1)
            } else {
                (ident, cols + 1)
            }
        });

    if cols == 0 {
        0.0
    } else {
        ident as f64 * 100.0 / cols as f64
    }
}

/// Sort hits by identity, then score, both descending.
///
/// The sort is stable: hits that tie on both keys keep their input order.
pub fn rank(mut hits: Vec<RankedHit>) -> Vec<RankedHit> {
    hits.sort_by(|a, b| {
        b.identity_percent
            .partial_cmp(&a.identity_percent)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.score.cmp(&a.score))
    });
    hits
}

/// Keep the first `n` ranked hits.
///
/// When even the best hit has identity 0 there is no significant hit and
/// the result is empty.
pub fn top_n(mut ranked: Vec<RankedHit>, n: usize) -> Vec<RankedHit> {
    match ranked.first() {
        Some(best) if best.identity_percent > 0.0 => {
            ranked.truncate(n);
            ranked
        }
        _ => Vec::new(),
    }
}
