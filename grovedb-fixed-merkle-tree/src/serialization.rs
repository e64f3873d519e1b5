//! Persistable tree records.
//!
//! Both records carry the leaves rather than the hashed layers; the layers
//! are rebuilt on restore and checked against the stored root. The JSON form
//! uses camelCase keys:
//!
//! ```text
//! { "levels": 10, "root": "<hex>", "zeroElement": 0, "elements": [1, 2, 3] }
//! ```
//!
//! Partial records add `initialRoot`, `edgeIndex`, `edgeElement`, `edgePath`
//! and `edgeElementsCount`, and list only the leaves from `edgeIndex` on. The
//! edge fields describe the tree at the time it was serialized.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Digest, Element, MerkleTreeError, ProofPath, Result, TreeEdge};

/// Upper bound on decoded record size.
const DECODE_LIMIT: usize = 100 * 1024 * 1024;

/// Serialized form of a [`FixedMerkleTree`](crate::FixedMerkleTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTree {
    pub levels: usize,
    pub root: Digest,
    pub zero_element: Element,
    pub elements: Vec<Element>,
}

/// Serialized form of a [`PartialMerkleTree`](crate::PartialMerkleTree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPartialTree {
    pub levels: usize,
    pub root: Digest,
    /// Root the partial tree was first built against.
    pub initial_root: Digest,
    pub zero_element: Element,
    /// Leaves from `edge_index` on.
    pub elements: Vec<Element>,
    pub edge_index: usize,
    pub edge_element: Element,
    pub edge_path: ProofPath,
    pub edge_elements_count: usize,
}

impl SerializedPartialTree {
    pub(crate) fn edge(&self) -> TreeEdge {
        TreeEdge {
            edge_index: self.edge_index,
            edge_element: self.edge_element.clone(),
            edge_path: self.edge_path.clone(),
            edge_elements_count: self.edge_elements_count,
        }
    }
}

/// Record types with a JSON text form and a bincode binary form.
pub trait TreeRecord: Serialize + DeserializeOwned + Encode + Decode<()> + Sized {
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode to bytes using bincode.
    fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| MerkleTreeError::Serialization(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<DECODE_LIMIT>();
        let (record, _): (Self, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleTreeError::Serialization(format!("decode error: {}", e)))?;
        Ok(record)
    }
}

impl TreeRecord for SerializedTree {}

impl TreeRecord for SerializedPartialTree {}
