use crate::libs::error::{ProtreeError, Result};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use regex::Regex as TextRegex;

lazy_static! {
    // x, x(3), x(2,4)
    static ref RE_ANY: TextRegex =
        TextRegex::new(r"^[xX](?:\((\d+)(?:,(\d+))?\))?$").unwrap();
}

/// Rewrite a PROSITE-style pattern into a regular expression.
///
/// Elements are separated by `-`. `x` becomes a single wildcard, `x(n)` a run
/// of `n` wildcards and `x(n,m)` a bounded repeat; every other element is
/// passed through as written. Surrounding `<`, `>` and a trailing `.` are
/// turned into anchors or dropped.
///
/// ```
/// use protree::libs::motif::translate;
/// assert_eq!(translate("P-X(2)-G").unwrap(), "P..G");
/// ```
///
/// A repeat count that does not fit in `usize`, or a range whose lower
/// bound exceeds the upper one, is a [`ProtreeError::InvalidParameter`].
pub fn translate(pattern: &str) -> Result<String> {
    let mut pattern = pattern.trim();
    pattern = pattern.strip_suffix('.').unwrap_or(pattern);

    let mut out = String::new();
    if let Some(rest) = pattern.strip_prefix('<') {
        out.push('^');
        pattern = rest;
    }
    let anchored_end = pattern.ends_with('>');
    pattern = pattern.strip_suffix('>').unwrap_or(pattern);

    for element in pattern.split('-').filter(|e| !e.is_empty()) {
        match RE_ANY.captures(element) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (None, _) => out.push('.'),
                (Some(n), None) => {
                    let n = repeat_count(element, n.as_str())?;
                    out.push_str(&".".repeat(n));
                }
                (Some(n), Some(m)) => {
                    let n = repeat_count(element, n.as_str())?;
                    let m = repeat_count(element, m.as_str())?;
                    if n > m {
                        return Err(ProtreeError::InvalidParameter(format!(
                            "bad motif element {}: {} > {}",
                            element, n, m
                        )));
                    }
                    out.push_str(&format!(".{{{},{}}}", n, m));
                }
            },
            None => out.push_str(&element.replace('{', "[^").replace('}', "]")),
        }
    }

    if anchored_end {
        out.push('$');
    }
    Ok(out)
}

fn repeat_count(element: &str, digits: &str) -> Result<usize> {
    digits.parse().map_err(|_| {
        ProtreeError::InvalidParameter(format!(
            "bad motif element {}: repeat count out of range",
            element
        ))
    })
}

/// One occurrence of a motif in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifHit {
    /// 1-based, inclusive
    pub start: usize,
    /// 1-based, inclusive
    pub end: usize,
    pub matched: String,
}

/// A compiled motif matcher.
#[derive(Debug, Clone)]
pub struct Motif {
    pattern: String,
    regex: Regex,
}

impl Motif {
    pub fn compile(pattern: &str) -> Result<Self> {
        let translated = translate(pattern)?;
        if translated.is_empty() {
            return Err(ProtreeError::InvalidParameter("empty motif".to_string()));
        }
        let regex = Regex::new(&format!("(?i){}", translated)).map_err(|e| {
            ProtreeError::InvalidParameter(format!("bad motif {}: {}", pattern, e))
        })?;
        Ok(Self {
            pattern: translated,
            regex,
        })
    }

    /// The translated regular expression.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, residues: &[u8]) -> bool {
        self.regex.is_match(residues)
    }

    /// Every hit, overlapping ones included, in order of start position.
    pub fn find_all(&self, residues: &[u8]) -> Vec<MotifHit> {
        let mut hits = Vec::new();
        let mut pos = 0;
        while pos < residues.len() {
            let m = match self.regex.find_at(residues, pos) {
                Some(m) => m,
                None => break,
            };
            if m.end() > m.start() {
                hits.push(MotifHit {
                    start: m.start() + 1,
                    end: m.end(),
                    matched: String::from_utf8_lossy(m.as_bytes()).into_owned(),
                });
            }
            pos = m.start() + 1;
        }
        hits
    }
}
