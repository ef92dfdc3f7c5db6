/// Errors raised at the crate boundary. The clustering pass itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum GreedyError {
    #[error("score matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("score matrix has no nodes")]
    Empty,

    #[error("invalid permutation: {reason}")]
    InvalidPermutation { reason: String },

    #[error("unknown strategy `{0}` (expected soon, best-link, voted-link or pivot)")]
    UnknownStrategy(String),
}

pub type Result<T> = std::result::Result<T, GreedyError>;
