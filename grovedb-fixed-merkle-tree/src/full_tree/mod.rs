use std::fmt;

use tracing::{debug, trace};

use crate::{
    Blake3Hasher, Digest, Element, MerkleHasher, MerkleTreeError, ProofPath, Result,
    SerializedTree, TreeEdge, TreeOptions, TreeRecord, TreeSlice,
    hash::{capacity_for_levels, validate_levels, zero_hashes},
    layers::LayerStore,
};

#[cfg(test)]
mod tests;

/// A fixed-depth Merkle tree keeping every leaf and every internal node.
///
/// Leaves are appended left to right. Absent nodes are filled with the
/// per-level zero hashes of the configured zero element, so the root is
/// always that of a complete tree with `2^levels` leaves.
#[derive(Debug, Clone)]
pub struct FixedMerkleTree<H = Blake3Hasher> {
    levels: usize,
    hasher: H,
    zero_element: Element,
    elements: Vec<Element>,
    layers: LayerStore,
}

impl FixedMerkleTree<Blake3Hasher> {
    /// Build a Blake3 tree with the default zero element.
    pub fn with_default_options(levels: usize, elements: Vec<Element>) -> Result<Self> {
        Self::new(levels, elements, TreeOptions::default())
    }
}

impl<H: MerkleHasher> FixedMerkleTree<H> {
    /// Build a tree of depth `levels` holding `elements`.
    ///
    /// Fails with `TreeFull` if there are more than `2^levels` elements.
    pub fn new(levels: usize, elements: Vec<Element>, options: TreeOptions<H>) -> Result<Self> {
        validate_levels(levels)?;
        let capacity = capacity_for_levels(levels);
        if elements.len() > capacity {
            return Err(MerkleTreeError::TreeFull { capacity });
        }

        let TreeOptions {
            hasher,
            zero_element,
        } = options;
        let zeros = zero_hashes(&hasher, zero_element.digest(), levels);
        let mut layers = LayerStore::full(levels, zeros);
        layers.push_leaves(elements.iter().map(Element::digest));
        layers.rehash_from(&hasher, 0);

        debug!(
            target: "merkle::full",
            levels,
            leaves = elements.len(),
            root = %layers.root(),
            "built fixed merkle tree"
        );

        Ok(Self {
            levels,
            hasher,
            zero_element,
            elements,
            layers,
        })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Maximum number of leaves, `2^levels`.
    pub fn capacity(&self) -> usize {
        capacity_for_levels(self.levels)
    }

    /// Number of leaves inserted so far.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn root(&self) -> Digest {
        self.layers.root()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn zero_element(&self) -> &Element {
        &self.zero_element
    }

    /// Copy of the inserted leaves.
    pub fn elements(&self) -> Vec<Element> {
        self.elements.clone()
    }

    /// Copy of every layer, leaves first. Layer `levels` holds the root once
    /// the tree has a leaf.
    pub fn layers(&self) -> Vec<Vec<Digest>> {
        self.layers.layers()
    }

    /// Copy of the per-level zero hashes.
    pub fn zeros(&self) -> Vec<Digest> {
        self.layers.zeros()
    }

    /// Append one leaf.
    pub fn insert(&mut self, element: impl Into<Element>) -> Result<()> {
        if self.len() >= self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }
        self.update(self.len(), element)
    }

    /// Append many leaves, rehashing each level once for the whole batch.
    ///
    /// Empty entries are skipped. The resulting root is the same as inserting
    /// the remaining entries one at a time.
    pub fn bulk_insert<I, E>(&mut self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        let batch: Vec<Element> = elements
            .into_iter()
            .map(Into::into)
            .filter(|e| !e.is_empty())
            .collect();
        if batch.is_empty() {
            return Ok(());
        }
        if self.len() + batch.len() > self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let start = self.len();
        self.layers.push_leaves(batch.iter().map(Element::digest));
        self.elements.extend(batch);
        self.layers.rehash_from(&self.hasher, start);

        debug!(
            target: "merkle::full",
            start,
            inserted = self.len() - start,
            root = %self.root(),
            "bulk inserted leaves"
        );
        Ok(())
    }

    /// Replace the leaf at `index`. `index == len()` appends.
    pub fn update(&mut self, index: usize, element: impl Into<Element>) -> Result<()> {
        if index > self.len() {
            return Err(MerkleTreeError::IndexOutOfBounds(index));
        }
        if index >= self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let element = element.into();
        self.layers.set_leaf(index, element.digest());
        if index == self.elements.len() {
            self.elements.push(element);
        } else {
            self.elements[index] = element;
        }
        self.layers.rehash_path(&self.hasher, index);

        trace!(target: "merkle::full", index, root = %self.root(), "updated leaf");
        Ok(())
    }

    /// First index holding `element`, by strict equality.
    pub fn index_of(&self, element: &Element) -> Option<usize> {
        self.elements.iter().position(|stored| stored == element)
    }

    /// First index where `comparator(stored, element)` holds.
    pub fn index_of_by<F>(&self, element: &Element, comparator: F) -> Option<usize>
    where
        F: Fn(&Element, &Element) -> bool,
    {
        self.elements
            .iter()
            .position(|stored| comparator(stored, element))
    }

    /// Proof path for the leaf at `index`.
    pub fn path(&self, index: usize) -> Result<ProofPath> {
        if index >= self.len() {
            return Err(MerkleTreeError::IndexOutOfBounds(index));
        }
        let (path_elements, path_indices, path_positions) = self.layers.siblings(index);
        Ok(ProofPath {
            path_elements,
            path_indices,
            path_positions,
            path_root: self.root(),
        })
    }

    /// Proof path for the first leaf equal to `element`.
    pub fn proof(&self, element: &Element) -> Result<ProofPath> {
        let index = self
            .index_of(element)
            .ok_or(MerkleTreeError::ElementNotFound)?;
        self.path(index)
    }

    /// Edge record for the first leaf equal to `element`.
    pub fn get_tree_edge(&self, element: &Element) -> Result<TreeEdge> {
        let index = self
            .index_of(element)
            .ok_or(MerkleTreeError::ElementNotFound)?;
        self.get_tree_edge_at(index)
    }

    /// Edge record for the leaf at `index`.
    pub fn get_tree_edge_at(&self, index: usize) -> Result<TreeEdge> {
        let edge_path = self.path(index)?;
        debug!(target: "merkle::full", edge_index = index, "exported tree edge");
        Ok(TreeEdge {
            edge_index: index,
            edge_element: self.elements[index].clone(),
            edge_path,
            edge_elements_count: self.len(),
        })
    }

    /// Split the leaves into about `count` runs, each with the edge of its
    /// first leaf.
    ///
    /// Runs have an even length of `ceil(len / count)` rounded up, so the last
    /// run may be shorter or some runs may be missing for small trees.
    pub fn get_tree_slices(&self, count: usize) -> Result<Vec<TreeSlice>> {
        if count == 0 {
            return Err(MerkleTreeError::InvalidData(
                "slice count must be positive".to_string(),
            ));
        }
        let mut size = self.len().div_ceil(count);
        if size % 2 == 1 {
            size += 1;
        }
        if size == 0 {
            return Ok(Vec::new());
        }

        (0..self.len())
            .step_by(size)
            .map(|start| {
                let end = (start + size).min(self.len());
                Ok(TreeSlice {
                    edge: self.get_tree_edge_at(start)?,
                    elements: self.elements[start..end].to_vec(),
                })
            })
            .collect()
    }

    pub fn serialize(&self) -> SerializedTree {
        SerializedTree {
            levels: self.levels,
            root: self.root(),
            zero_element: self.zero_element.clone(),
            elements: self.elements.clone(),
        }
    }

    /// Rebuild a tree from its record. The rebuilt root must match the
    /// recorded one, which also catches a hasher that differs from the one
    /// the record was written with.
    pub fn deserialize(record: SerializedTree, hasher: H) -> Result<Self> {
        let options = TreeOptions {
            hasher,
            zero_element: record.zero_element,
        };
        let tree = Self::new(record.levels, record.elements, options)?;
        if tree.root() != record.root {
            return Err(MerkleTreeError::RootMismatch {
                expected: record.root,
                computed: tree.root(),
            });
        }
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    pub fn from_json(json: &str, hasher: H) -> Result<Self> {
        Self::deserialize(SerializedTree::from_json(json)?, hasher)
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        self.serialize().encode_to_vec()
    }

    pub fn decode_from_slice(bytes: &[u8], hasher: H) -> Result<Self> {
        Self::deserialize(SerializedTree::decode_from_slice(bytes)?, hasher)
    }
}

impl<H: MerkleHasher> fmt::Display for FixedMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
