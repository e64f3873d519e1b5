use thiserror::Error;

use crate::Digest;

/// Alias for `core::result::Result<T, MerkleTreeError>`.
pub type Result<T> = core::result::Result<T, MerkleTreeError>;

/// Errors from fixed Merkle tree operations.
///
/// Every check runs before the tree is touched, so a returned error always
/// leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleTreeError {
    /// An insert, bulk insert or update would place a leaf at or past
    /// capacity.
    #[error("Tree is full (capacity {capacity})")]
    TreeFull { capacity: usize },
    /// An update or path request referenced a leaf outside the valid range.
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
    /// A partial tree was asked for a leaf that was pruned away.
    #[error("index {index} is below the edge: {edge_index}")]
    BelowEdge { index: usize, edge_index: usize },
    /// A lookup by element found no match.
    #[error("element not found")]
    ElementNotFound,
    #[error("levels must be between 1 and {max}, got {levels}")]
    InvalidLevels { levels: usize, max: usize },
    /// A rebuilt tree does not hash to the root it was expected to have.
    #[error("root mismatch: expected {expected}, computed {computed}")]
    RootMismatch { expected: Digest, computed: Digest },
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MerkleTreeError {
    fn from(e: serde_json::Error) -> Self {
        MerkleTreeError::Serialization(e.to_string())
    }
}
