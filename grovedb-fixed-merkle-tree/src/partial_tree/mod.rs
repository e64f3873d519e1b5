use std::fmt;

use tracing::{debug, trace};

use crate::{
    Blake3Hasher, Digest, Element, MerkleHasher, MerkleTreeError, ProofPath, Result,
    SerializedPartialTree, TreeEdge, TreeOptions, TreeRecord,
    hash::{capacity_for_levels, validate_levels, zero_hashes},
    layers::LayerStore,
};


/// A fixed-depth Merkle tree that only keeps the leaves from an edge onwards.
///
/// Everything left of `edge_index` is represented by at most one digest per
/// level, taken from the edge's proof path. The root is identical to that of
/// the full tree the edge came from, and stays identical as long as both trees
/// receive the same mutations. Leaves below the edge cannot be read, updated
/// or proven.
///
/// Indices are global: leaf `edge_index` is the first local element.
#[derive(Debug, Clone)]
pub struct PartialMerkleTree<H = Blake3Hasher> {
    levels: usize,
    hasher: H,
    zero_element: Element,
    edge: TreeEdge,
    /// Root the tree was bootstrapped against.
    initial_root: Digest,
    /// Leaves from `edge.edge_index` onwards.
    elements: Vec<Element>,
    layers: LayerStore,
}

impl<H: MerkleHasher> PartialMerkleTree<H> {
    /// Build from an edge exported by a full tree, the leaves from the edge on
    /// (edge leaf first), and the root the result must hash to.
    pub fn new(
        levels: usize,
        edge: TreeEdge,
        leaves_after_edge: Vec<Element>,
        known_root: Digest,
        options: TreeOptions<H>,
    ) -> Result<Self> {
        let TreeOptions {
            hasher,
            zero_element,
        } = options;
        let layers = build_layers(levels, &hasher, &zero_element, &edge, &leaves_after_edge)?;
        if layers.root() != known_root {
            return Err(MerkleTreeError::RootMismatch {
                expected: known_root,
                computed: layers.root(),
            });
        }

        debug!(
            target: "merkle::partial",
            levels,
            edge_index = edge.edge_index,
            leaves = leaves_after_edge.len(),
            root = %layers.root(),
            "built partial merkle tree"
        );

        let mut tree = Self {
            levels,
            hasher,
            zero_element,
            edge,
            initial_root: known_root,
            elements: leaves_after_edge,
            layers,
        };
        tree.refresh_edge();
        Ok(tree)
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Maximum number of leaves, `2^levels`, counting pruned ones.
    pub fn capacity(&self) -> usize {
        capacity_for_levels(self.levels)
    }

    /// Number of leaves held locally, from the edge on.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`: the edge leaf itself is kept.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of leaves in the whole logical tree, pruned ones included.
    pub fn global_len(&self) -> usize {
        self.edge.edge_index + self.elements.len()
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

    /// First addressable leaf index.
    pub fn edge_index(&self) -> usize {
        self.edge.edge_index
    }

    /// Current leaf at the edge.
    pub fn edge_element(&self) -> &Element {
        &self.edge.edge_element
    }

    /// Current proof path of the edge leaf. It verifies against `root()`.
    pub fn edge_path(&self) -> &ProofPath {
        &self.edge.edge_path
    }

    /// Root passed to [`PartialMerkleTree::new`]. Mutations, `shift_edge` and
    /// serialization round trips leave it unchanged.
    pub fn initial_root(&self) -> Digest {
        self.initial_root
    }

    /// Copy of the local leaves, edge leaf first.
    pub fn elements(&self) -> Vec<Element> {
        self.elements.clone()
    }

    /// Copy of the locally stored layers. Entry `i` of layer `l` is node
    /// `(l, (edge_index >> l) + i)`.
    pub fn layers(&self) -> Vec<Vec<Digest>> {
        self.layers.layers()
    }

    /// Copy of the per-level zero hashes.
    pub fn zeros(&self) -> Vec<Digest> {
        self.layers.zeros()
    }

    fn check_addressable(&self, index: usize) -> Result<()> {
        if index < self.edge.edge_index {
            return Err(MerkleTreeError::BelowEdge {
                index,
                edge_index: self.edge.edge_index,
            });
        }
        Ok(())
    }

    /// Re-derive the stored edge from the current layers. Left siblings never
    /// change, so the frontier it encodes stays the same.
    fn refresh_edge(&mut self) {
        let (path_elements, path_indices, path_positions) =
            self.layers.siblings(self.edge.edge_index);
        self.edge.edge_path = ProofPath {
            path_elements,
            path_indices,
            path_positions,
            path_root: self.layers.root(),
        };
        if let Some(first) = self.elements.first() {
            self.edge.edge_element = first.clone();
        }
        self.edge.edge_elements_count = self.global_len();
    }

    /// Append one leaf.
    pub fn insert(&mut self, element: impl Into<Element>) -> Result<()> {
        if self.global_len() >= self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }
        self.update(self.global_len(), element)
    }

    /// Append many leaves, rehashing each level once for the whole batch.
    /// Empty entries are skipped.
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
        if self.global_len() + batch.len() > self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let start = self.global_len();
        self.layers.push_leaves(batch.iter().map(Element::digest));
        self.elements.extend(batch);
        self.layers.rehash_from(&self.hasher, start);
        self.refresh_edge();

        debug!(
            target: "merkle::partial",
            start,
            inserted = self.global_len() - start,
            root = %self.root(),
            "bulk inserted leaves"
        );
        Ok(())
    }

    /// Replace the leaf at global `index`. `index == global_len()` appends.
    pub fn update(&mut self, index: usize, element: impl Into<Element>) -> Result<()> {
        self.check_addressable(index)?;
        if index > self.global_len() {
            return Err(MerkleTreeError::IndexOutOfBounds(index));
        }
        if index >= self.capacity() {
            return Err(MerkleTreeError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let element = element.into();
        let local = index - self.edge.edge_index;
        self.layers.set_leaf(index, element.digest());
        if local == self.elements.len() {
            self.elements.push(element);
        } else {
            self.elements[local] = element;
        }
        self.layers.rehash_path(&self.hasher, index);
        self.refresh_edge();

        trace!(target: "merkle::partial", index, root = %self.root(), "updated leaf");
        Ok(())
    }

    /// Global index of the first local leaf equal to `element`.
    pub fn index_of(&self, element: &Element) -> Option<usize> {
        self.index_of_by(element, |stored, target| stored == target)
    }

    /// Global index of the first local leaf where `comparator(stored,
    /// element)` holds.
    pub fn index_of_by<F>(&self, element: &Element, comparator: F) -> Option<usize>
    where
        F: Fn(&Element, &Element) -> bool,
    {
        self.elements
            .iter()
            .position(|stored| comparator(stored, element))
            .map(|local| self.edge.edge_index + local)
    }

    /// Proof path for the leaf at global `index`.
    pub fn path(&self, index: usize) -> Result<ProofPath> {
        self.check_addressable(index)?;
        if index >= self.global_len() {
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

    /// Proof path for the first local leaf equal to `element`.
    pub fn proof(&self, element: &Element) -> Result<ProofPath> {
        let index = self
            .index_of(element)
            .ok_or(MerkleTreeError::ElementNotFound)?;
        self.path(index)
    }

    /// Edge record for the first local leaf equal to `element`.
    pub fn get_tree_edge(&self, element: &Element) -> Result<TreeEdge> {
        let index = self
            .index_of(element)
            .ok_or(MerkleTreeError::ElementNotFound)?;
        self.get_tree_edge_at(index)
    }

    /// Edge record for the leaf at global `index`, usable to prune further.
    pub fn get_tree_edge_at(&self, index: usize) -> Result<TreeEdge> {
        let edge_path = self.path(index)?;
        Ok(TreeEdge {
            edge_index: index,
            edge_element: self.elements[index - self.edge.edge_index].clone(),
            edge_path,
            edge_elements_count: self.global_len(),
        })
    }

    /// Move the edge left to an earlier `edge`, filling in the leaves between
    /// the new and the current edge.
    ///
    /// `elements` must be exactly the leaves in `[edge.edge_index,
    /// edge_index())`. The root must not change; the tree is only replaced
    /// once the rebuilt one checks out.
    pub fn shift_edge(&mut self, edge: TreeEdge, elements: Vec<Element>) -> Result<()> {
        let current = self.edge.edge_index;
        if edge.edge_index >= current {
            return Err(MerkleTreeError::InvalidData(format!(
                "new edge index {} must be below the current edge {}",
                edge.edge_index, current
            )));
        }
        if elements.len() != current - edge.edge_index {
            return Err(MerkleTreeError::InvalidData(format!(
                "expected {} leaves between edges {} and {}, got {}",
                current - edge.edge_index,
                edge.edge_index,
                current,
                elements.len()
            )));
        }

        let mut leaves = elements;
        leaves.extend(self.elements.iter().cloned());
        let layers = build_layers(self.levels, &self.hasher, &self.zero_element, &edge, &leaves)?;
        if layers.root() != self.root() {
            return Err(MerkleTreeError::RootMismatch {
                expected: self.root(),
                computed: layers.root(),
            });
        }

        debug!(
            target: "merkle::partial",
            from = current,
            to = edge.edge_index,
            "shifted tree edge"
        );
        self.edge = edge;
        self.elements = leaves;
        self.layers = layers;
        self.refresh_edge();
        Ok(())
    }

    pub fn serialize(&self) -> SerializedPartialTree {
        SerializedPartialTree {
            levels: self.levels,
            root: self.root(),
            initial_root: self.initial_root,
            zero_element: self.zero_element.clone(),
            elements: self.elements.clone(),
            edge_index: self.edge.edge_index,
            edge_element: self.edge.edge_element.clone(),
            edge_path: self.edge.edge_path.clone(),
            edge_elements_count: self.edge.edge_elements_count,
        }
    }

    /// Rebuild a partial tree from its record. It stays addressable only from
    /// the recorded edge.
    pub fn deserialize(record: SerializedPartialTree, hasher: H) -> Result<Self> {
        let edge = record.edge();
        let options = TreeOptions {
            hasher,
            zero_element: record.zero_element,
        };
        let mut tree = Self::new(record.levels, edge, record.elements, record.root, options)?;
        tree.initial_root = record.initial_root;
        Ok(tree)
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    pub fn from_json(json: &str, hasher: H) -> Result<Self> {
        Self::deserialize(SerializedPartialTree::from_json(json)?, hasher)
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        self.serialize().encode_to_vec()
    }

    pub fn decode_from_slice(bytes: &[u8], hasher: H) -> Result<Self> {
        Self::deserialize(SerializedPartialTree::decode_from_slice(bytes)?, hasher)
    }
}

impl<H: MerkleHasher> fmt::Display for PartialMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Validate an edge against its leaves and hash the retained region.
fn build_layers<H: MerkleHasher>(
    levels: usize,
    hasher: &H,
    zero_element: &Element,
    edge: &TreeEdge,
    leaves: &[Element],
) -> Result<LayerStore> {
    validate_levels(levels)?;
    edge.validate(levels)?;
    match leaves.first() {
        None => {
            return Err(MerkleTreeError::InvalidData(
                "a partial tree needs at least the edge leaf".to_string(),
            ));
        }
        Some(first) if *first != edge.edge_element => {
            return Err(MerkleTreeError::InvalidData(format!(
                "first leaf {} does not match edge element {}",
                first, edge.edge_element
            )));
        }
        Some(_) => {}
    }
    let capacity = capacity_for_levels(levels);
    if edge.edge_index + leaves.len() > capacity {
        return Err(MerkleTreeError::TreeFull { capacity });
    }

    let zeros = zero_hashes(hasher, zero_element.digest(), levels);
    let mut layers = LayerStore::with_frontier(levels, zeros, edge.edge_index, edge.frontier(levels));
    layers.push_leaves(leaves.iter().map(Element::digest));
    layers.rehash_from(hasher, edge.edge_index);
    Ok(layers)
}
