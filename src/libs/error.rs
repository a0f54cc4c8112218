/// Errors returned by the alignment and phylogeny engine.
///
/// Every core operation is a pure function over its inputs; nothing is
/// logged and swallowed here, the caller decides how to present it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtreeError {
    /// A zero-length sequence or an empty target set.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Fewer sequences than the algorithm requires.
    #[error("insufficient input: need at least {needed} sequences, got {got}")]
    InsufficientInput { needed: usize, got: usize },

    /// Non-positive top-N or bootstrap count, duplicate ids, malformed matrix, ...
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller's cancellation token fired or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// Tree arena wiring failed.
    #[error("tree error: {0}")]
    Tree(String),
}

pub type Result<T> = std::result::Result<T, ProtreeError>;

impl From<String> for ProtreeError {
    fn from(msg: String) -> Self {
        ProtreeError::Tree(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ProtreeError::InsufficientInput { needed: 2, got: 1 };
        assert_eq!(
            err.to_string(),
            "insufficient input: need at least 2 sequences, got 1"
        );
        assert_eq!(
            ProtreeError::EmptyInput("query".to_string()).to_string(),
            "empty input: query"
        );
    }

    #[test]
    fn test_from_string() {
        let err: ProtreeError = "Node 3 not found".to_string().into();
        assert_eq!(err, ProtreeError::Tree("Node 3 not found".to_string()));
    }
}
