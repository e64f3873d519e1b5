//! Proof paths and the edge records used to bootstrap partial trees.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{Digest, Element, MerkleTreeError, Result};

/// The siblings needed to recompute the root from one leaf.
///
/// Entry `l` of each vector describes level `l`, leaf level first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct ProofPath {
    /// Sibling digest at each level.
    pub path_elements: Vec<Digest>,
    /// `0` when the path node is a left child, `1` when it is a right child.
    pub path_indices: Vec<u8>,
    /// Index of the sibling within its level.
    pub path_positions: Vec<usize>,
    /// Root of the tree the path was taken from.
    pub path_root: Digest,
}

impl ProofPath {
    /// Leaf index encoded by the direction bits.
    pub fn leaf_index(&self) -> usize {
        self.path_indices
            .iter()
            .enumerate()
            .fold(0, |index, (level, &bit)| index | ((bit as usize) << level))
    }
}

/// Everything a partial tree needs to stand in for the leaves left of
/// `edge_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct TreeEdge {
    /// First addressable leaf.
    pub edge_index: usize,
    /// Leaf stored at `edge_index` when the edge was taken.
    pub edge_element: Element,
    /// Proof path of the edge leaf at that time.
    pub edge_path: ProofPath,
    /// Leaf count of the source tree at that time.
    pub edge_elements_count: usize,
}

impl TreeEdge {
    /// Check that the path is shaped for `levels` and really belongs to
    /// `edge_index`.
    pub(crate) fn validate(&self, levels: usize) -> Result<()> {
        let path = &self.edge_path;
        if path.path_elements.len() != levels
            || path.path_indices.len() != levels
            || path.path_positions.len() != levels
        {
            return Err(MerkleTreeError::InvalidData(format!(
                "edge path has {} elements, {} indices and {} positions, expected {} of each",
                path.path_elements.len(),
                path.path_indices.len(),
                path.path_positions.len(),
                levels
            )));
        }
        if self.edge_index >> levels != 0 {
            return Err(MerkleTreeError::InvalidData(format!(
                "edge index {} does not fit a tree of {} levels",
                self.edge_index, levels
            )));
        }
        for level in 0..levels {
            let ancestor = self.edge_index >> level;
            if path.path_positions[level] != ancestor ^ 1
                || path.path_indices[level] as usize != ancestor & 1
            {
                return Err(MerkleTreeError::InvalidData(format!(
                    "edge path does not belong to index {} at level {}",
                    self.edge_index, level
                )));
            }
        }
        Ok(())
    }

    /// Per-level substitute for the node left of the retained region, `None`
    /// where the edge ancestor is a left child. Has `levels + 1` entries; the
    /// root level never needs one.
    pub(crate) fn frontier(&self, levels: usize) -> Vec<Option<Digest>> {
        (0..=levels)
            .map(|level| {
                (level < levels && (self.edge_index >> level) & 1 == 1)
                    .then(|| self.edge_path.path_elements[level])
            })
            .collect()
    }
}

/// A contiguous run of leaves together with the edge of its first leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSlice {
    pub edge: TreeEdge,
    pub elements: Vec<Element>,
}
