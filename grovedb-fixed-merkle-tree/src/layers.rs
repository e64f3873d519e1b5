//! Per-level node storage shared by the full and partial trees.
//!
//! Level `l` stores the nodes from index `boundary >> l` onwards. A full tree
//! has `boundary = 0` and stores everything. A partial tree stores only the
//! nodes at or right of the edge leaf's ancestors, and keeps one frontier
//! digest per level for the left sibling of the ancestor at that level (only
//! present when the ancestor is a right child).
//!
//! Walking up from any leaf at or after the boundary, the only node left of
//! the stored region that is ever read is `(boundary >> l) - 1`, which is
//! exactly the frontier digest.

use crate::{Digest, MerkleHasher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayerStore {
    levels: usize,
    boundary: usize,
    /// `nodes[l][i]` is node `(l, (boundary >> l) + i)`.
    nodes: Vec<Vec<Digest>>,
    frontier: Vec<Option<Digest>>,
    zeros: Vec<Digest>,
}

impl LayerStore {
    /// Storage for a full tree.
    pub(crate) fn full(levels: usize, zeros: Vec<Digest>) -> Self {
        Self::with_frontier(levels, zeros, 0, vec![None; levels + 1])
    }

    /// Storage starting at `boundary`, with `frontier[l]` substituting for
    /// node `(l, (boundary >> l) - 1)`.
    pub(crate) fn with_frontier(
        levels: usize,
        zeros: Vec<Digest>,
        boundary: usize,
        frontier: Vec<Option<Digest>>,
    ) -> Self {
        debug_assert_eq!(zeros.len(), levels + 1);
        debug_assert_eq!(frontier.len(), levels + 1);
        Self {
            levels,
            boundary,
            nodes: vec![Vec::new(); levels + 1],
            frontier,
            zeros,
        }
    }

    fn offset(&self, level: usize) -> usize {
        self.boundary >> level
    }

    /// Global number of nodes present at `level`.
    pub(crate) fn len(&self, level: usize) -> usize {
        self.offset(level) + self.nodes[level].len()
    }

    pub(crate) fn zero(&self, level: usize) -> Digest {
        self.zeros[level]
    }

    /// Node `(level, index)`; zero past the end, frontier left of the
    /// boundary.
    pub(crate) fn node(&self, level: usize, index: usize) -> Digest {
        let offset = self.offset(level);
        if index >= offset {
            return self.nodes[level]
                .get(index - offset)
                .copied()
                .unwrap_or(self.zeros[level]);
        }
        debug_assert_eq!(index + 1, offset, "read below the frontier at level {level}");
        self.frontier[level].unwrap_or(self.zeros[level])
    }

    fn set(&mut self, level: usize, index: usize, digest: Digest) {
        let local = index - self.offset(level);
        let layer = &mut self.nodes[level];
        if local < layer.len() {
            layer[local] = digest;
        } else {
            layer.resize(local, self.zeros[level]);
            layer.push(digest);
        }
    }

    pub(crate) fn set_leaf(&mut self, index: usize, digest: Digest) {
        self.set(0, index, digest);
    }

    pub(crate) fn push_leaves(&mut self, digests: impl IntoIterator<Item = Digest>) {
        self.nodes[0].extend(digests);
    }

    /// Recompute the ancestors of leaf `index`.
    pub(crate) fn rehash_path<H: MerkleHasher>(&mut self, hasher: &H, index: usize) {
        let mut index = index;
        for level in 1..=self.levels {
            index >>= 1;
            let left = self.node(level - 1, index * 2);
            let right = self.node(level - 1, index * 2 + 1);
            self.set(level, index, hasher.hash(&left, &right));
        }
    }

    /// Recompute every node whose subtree contains a leaf at or after
    /// `start`, one pass per level.
    pub(crate) fn rehash_from<H: MerkleHasher>(&mut self, hasher: &H, start: usize) {
        let mut start = start;
        for level in 1..=self.levels {
            start >>= 1;
            let from = start.max(self.offset(level));
            let end = self.len(level - 1).div_ceil(2);
            for index in from..end {
                let left = self.node(level - 1, index * 2);
                let right = self.node(level - 1, index * 2 + 1);
                self.set(level, index, hasher.hash(&left, &right));
            }
        }
    }

    pub(crate) fn root(&self) -> Digest {
        self.node(self.levels, 0)
    }

    /// Sibling digests, direction bits and sibling positions from leaf
    /// `index` up to, but excluding, the root.
    pub(crate) fn siblings(&self, index: usize) -> (Vec<Digest>, Vec<u8>, Vec<usize>) {
        let mut elements = Vec::with_capacity(self.levels);
        let mut indices = Vec::with_capacity(self.levels);
        let mut positions = Vec::with_capacity(self.levels);
        let mut index = index;
        for level in 0..self.levels {
            let sibling = index ^ 1;
            elements.push(self.node(level, sibling));
            indices.push((index & 1) as u8);
            positions.push(sibling);
            index >>= 1;
        }
        (elements, indices, positions)
    }

    pub(crate) fn layers(&self) -> Vec<Vec<Digest>> {
        self.nodes.clone()
    }

    pub(crate) fn zeros(&self) -> Vec<Digest> {
        self.zeros.clone()
    }
}
