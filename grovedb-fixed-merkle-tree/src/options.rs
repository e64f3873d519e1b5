use crate::{Blake3Hasher, Element, MerkleHasher};

/// Construction options shared by both tree variants.
#[derive(Debug, Clone)]
pub struct TreeOptions<H = Blake3Hasher> {
    /// Node combinator.
    pub hasher: H,
    /// Value standing in for an absent leaf; seeds the zero cache.
    pub zero_element: Element,
}

impl Default for TreeOptions<Blake3Hasher> {
    fn default() -> Self {
        Self {
            hasher: Blake3Hasher,
            zero_element: default_zero_element(),
        }
    }
}

impl TreeOptions<Blake3Hasher> {
    /// Blake3 hashing with a zero-valued empty leaf.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H> TreeOptions<H> {
    /// Replace the hasher, keeping the zero element.
    pub fn with_hasher<H2: MerkleHasher>(self, hasher: H2) -> TreeOptions<H2> {
        TreeOptions {
            hasher,
            zero_element: self.zero_element,
        }
    }

    pub fn with_zero_element(mut self, zero_element: impl Into<Element>) -> Self {
        self.zero_element = zero_element.into();
        self
    }
}

/// The empty leaf used when none is configured.
pub fn default_zero_element() -> Element {
    Element::Number(0)
}
