use crate::libs::error::{ProtreeError, Result};
use std::collections::HashMap;
use std::io::BufRead;

/// Row/column order of the built-in tables.
const AA_ORDER: &[u8; 24] = b"ARNDCQEGHILKMFPSTWYVBZX*";

/// BLOSUM62, NCBI reference values.
#[rustfmt::skip]
const BLOSUM62: [[i32; 24]; 24] = [
//    A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   B   Z   X   *
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0, -4], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1, -4], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1, -4], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1, -4], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1, -4], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1, -4], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1, -4], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1, -4], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1, -4], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1, -4], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1, -4], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1, -4], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2, -4], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0, -4], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0, -4], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2, -4], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1, -4], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1, -4], // V
    [-2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1, -4], // B
    [-1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4], // Z
    [ 0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1, -4], // X
    [-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1], // *
];

/// A protein substitution matrix with affine gap costs.
///
/// Scores live in a 256x256 byte-indexed table so lookups never branch.
/// Lowercase letters score like their uppercase forms; any byte outside the
/// alphabet scores like the ambiguity code `X`, which keeps the matrix total.
/// `gap_open` and `gap_extend` are positive costs: a gap of length `k` costs
/// `gap_open + (k - 1) * gap_extend`.
#[derive(Debug, Clone)]
pub struct ScoringMatrix {
    matrix: Vec<i32>,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for ScoringMatrix {
    fn default() -> Self {
        Self::blosum62()
    }
}

impl ScoringMatrix {
    /// BLOSUM62 with gap open 10, gap extend 1.
    pub fn blosum62() -> Self {
        let mut scores = Vec::with_capacity(AA_ORDER.len());
        for (i, &r) in AA_ORDER.iter().enumerate() {
            for (j, &c) in AA_ORDER.iter().enumerate() {
                scores.push((r, c, BLOSUM62[i][j]));
            }
        }
        Self::from_triples(&scores, 10, 1)
    }

    /// A flat match/mismatch matrix over the 24 protein symbols.
    pub fn identity(match_score: i32, mismatch: i32) -> Self {
        let mut scores = Vec::new();
        for &r in AA_ORDER {
            for &c in AA_ORDER {
                let s = if r == c { match_score } else { mismatch };
                scores.push((r, c, s));
            }
        }
        Self::from_triples(&scores, 10, 1)
    }

    /// Replace the gap costs (builder pattern).
    pub fn with_gaps(mut self, gap_open: i32, gap_extend: i32) -> Self {
        self.gap_open = gap_open;
        self.gap_extend = gap_extend;
        self
    }

    /// Get the substitution score for two residues.
    pub fn get_score(&self, r1: u8, r2: u8) -> i32 {
        self.matrix[(r1 as usize) * 256 + (r2 as usize)]
    }

    /// Cost of a gap of `len` residues.
    pub fn gap_cost(&self, len: usize) -> i32 {
        if len == 0 {
            0
        } else {
            self.gap_open + (len as i32 - 1) * self.gap_extend
        }
    }

    /// Check that gap costs are positive.
    pub fn validate(&self) -> Result<()> {
        if self.gap_open <= 0 || self.gap_extend <= 0 {
            return Err(ProtreeError::InvalidParameter(format!(
                "gap costs must be positive (open={}, extend={})",
                self.gap_open, self.gap_extend
            )));
        }
        if self.gap_extend > self.gap_open {
            log::warn!(
                "gap extend ({}) is larger than gap open ({})",
                self.gap_extend,
                self.gap_open
            );
        }
        Ok(())
    }

    /// Load from name (preset) or file.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        match name.to_lowercase().as_str() {
            "blosum62" => Ok(Self::blosum62()),
            _ => {
                let reader = crate::reader(name)?;
                Ok(Self::from_reader(reader)?)
            }
        }
    }

    /// Read a matrix in NCBI/BLAST text format.
    ///
    /// The first non-comment line lists the residue letters; every following
    /// line starts with a residue letter and holds one score per column.
    /// Lines starting with `#` are comments. The result must be symmetric.
    /// Gap costs default to 10/1.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut header: Vec<u8> = Vec::new();
        let mut scores: Vec<(u8, u8, i32)> = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| ProtreeError::InvalidParameter(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if header.is_empty() {
                if parts.iter().any(|p| p.len() != 1) {
                    return Err(ProtreeError::InvalidParameter(format!(
                        "bad matrix header: {}",
                        line
                    )));
                }
                header = parts.iter().map(|p| p.as_bytes()[0]).collect();
                continue;
            }

            if parts.len() != header.len() + 1 || parts[0].len() != 1 {
                return Err(ProtreeError::InvalidParameter(format!(
                    "bad matrix row: {}",
                    line
                )));
            }
            let row = parts[0].as_bytes()[0];
            for (j, field) in parts[1..].iter().enumerate() {
                let v = field.parse::<i32>().map_err(|_| {
                    ProtreeError::InvalidParameter(format!("bad score '{}'", field))
                })?;
                scores.push((row, header[j], v));
            }
        }

        if header.is_empty() || scores.len() != header.len() * header.len() {
            return Err(ProtreeError::InvalidParameter(
                "matrix is not square".to_string(),
            ));
        }

        let matrix = Self::from_triples(&scores, 10, 1);
        for &(r, c, _) in &scores {
            if matrix.get_score(r, c) != matrix.get_score(c, r) {
                return Err(ProtreeError::InvalidParameter(format!(
                    "matrix is not symmetric at {}/{}",
                    r as char, c as char
                )));
            }
        }

        Ok(matrix)
    }

    fn from_triples(scores: &[(u8, u8, i32)], gap_open: i32, gap_extend: i32) -> Self {
        let mut known = [false; 256];
        let mut pairs: HashMap<(u8, u8), i32> = HashMap::new();
        for &(r, c, s) in scores {
            let (r, c) = (r.to_ascii_uppercase(), c.to_ascii_uppercase());
            known[r as usize] = true;
            known[c as usize] = true;
            pairs.insert((r, c), s);
        }
        let fallback = scores.iter().map(|t| t.2).min().unwrap_or(-1);

        // Symbols outside the table are scored as X
        let canon = |b: usize| -> u8 {
            let u = (b as u8).to_ascii_uppercase();
            if known[u as usize] {
                u
            } else {
                b'X'
            }
        };

        let mut m = vec![0; 256 * 256];
        for i in 0..256 {
            for j in 0..256 {
                m[i * 256 + j] = *pairs.get(&(canon(i), canon(j))).unwrap_or(&fallback);
            }
        }

        ScoringMatrix {
            matrix: m,
            gap_open,
            gap_extend,
        }
    }
}
