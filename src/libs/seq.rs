use std::fmt;

/// A labelled protein sequence.
///
/// Residues are kept as uppercase ASCII bytes. Once built a `Sequence` is
/// never mutated; the engine only borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    residues: Vec<u8>,
}

impl Sequence {
    /// Build a sequence from raw text.
    ///
    /// Whitespace is dropped, letters are uppercased and a trailing `*`
    /// (stop codon) is trimmed.
    ///
    /// ```
    /// use protree::libs::seq::Sequence;
    ///
    /// let seq = Sequence::new("sp|P1", b"mk t*\n");
    /// assert_eq!(seq.residues(), b"MKT");
    /// ```
    pub fn new(id: impl Into<String>, residues: &[u8]) -> Self {
        let mut residues: Vec<u8> = residues
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| b.to_ascii_uppercase())
            .collect();
        while residues.last() == Some(&b'*') {
            residues.pop();
        }

        Self {
            id: id.into(),
            residues,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// A copy with gap symbols (`-` and `.`) removed.
    pub fn ungapped(&self) -> Sequence {
        Sequence {
            id: self.id.clone(),
            residues: self
                .residues
                .iter()
                .copied()
                .filter(|&b| !is_gap(b))
                .collect(),
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}\n{}", self.id, String::from_utf8_lossy(&self.residues))
    }
}

/// The gap symbol written into alignment rows.
pub const GAP: u8 = b'-';

pub fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}
