//! Test helpers shared by the tree test modules.

use crate::{Digest, Element, MerkleHasher, ProofPath};

/// Numeric elements for every value in `range`.
pub(crate) fn numbers(range: impl IntoIterator<Item = u64>) -> Vec<Element> {
    range.into_iter().map(Element::Number).collect()
}

/// Fold a proof path back up to a root, starting from `leaf`.
pub(crate) fn root_from_path<H: MerkleHasher>(
    hasher: &H,
    leaf: &Element,
    path: &ProofPath,
) -> Digest {
    path.path_elements
        .iter()
        .zip(&path.path_indices)
        .fold(leaf.digest(), |node, (sibling, &bit)| {
            if bit == 0 {
                hasher.hash(&node, sibling)
            } else {
                hasher.hash(sibling, &node)
            }
        })
}

/// Cheap, order-sensitive hasher for tests that want a non-default
/// combinator.
pub(crate) fn rotate_xor(left: &Digest, right: &Digest) -> Digest {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = left.as_bytes()[i].rotate_left(1) ^ right.as_bytes()[(i + 1) % 32];
    }
    Digest::new(out)
}
