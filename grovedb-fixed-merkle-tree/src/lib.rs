//! Fixed-depth incremental Merkle trees.
//!
//! A tree of depth `levels` has room for `2^levels` leaves, appended left to
//! right. Missing nodes are filled with per-level zero hashes derived from a
//! configurable zero element, so the root always commits to a complete tree.
//!
//! Two variants compute the same root:
//!
//! - [`FixedMerkleTree`] keeps every leaf and every internal node.
//! - [`PartialMerkleTree`] is bootstrapped from a [`TreeEdge`] exported by a
//!   full tree and keeps only the leaves from that edge onwards, plus one
//!   frontier digest per level standing in for everything to the left.
//!
//! Applying the same inserts, bulk inserts and updates (at or after the edge)
//! to both keeps their roots equal.
//!
//! Node hashing goes through the [`MerkleHasher`] trait; [`Blake3Hasher`] is
//! the default and any `Fn(&Digest, &Digest) -> Digest` works too.

mod element;
mod error;
mod full_tree;
pub(crate) mod hash;
pub(crate) mod layers;
mod options;
mod partial_tree;
mod proof;
mod serialization;

#[cfg(test)]
pub(crate) mod test_utils;

pub use element::Element;
pub use error::{MerkleTreeError, Result};
pub use full_tree::FixedMerkleTree;
pub use hash::{Blake3Hasher, Digest, MAX_LEVELS, MerkleHasher};
pub use options::{TreeOptions, default_zero_element};
pub use partial_tree::PartialMerkleTree;
pub use proof::{ProofPath, TreeEdge, TreeSlice};
pub use serialization::{SerializedPartialTree, SerializedTree, TreeRecord};
