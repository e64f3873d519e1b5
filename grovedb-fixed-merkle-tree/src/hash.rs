use std::{fmt, str::FromStr};

use bincode::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{MerkleTreeError, Result};

/// Deepest tree supported. Capacity is `2^levels`, so this keeps capacity
/// representable as `usize` on 64-bit targets.
pub const MAX_LEVELS: usize = 32;

/// A 32-byte node hash.
///
/// Displayed and serialized as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse exactly 64 hex characters, with an optional `0x`/`0X` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| {
            MerkleTreeError::InvalidData(format!("bad digest hex {:?}: {}", s, e))
        })?;
        Ok(Self(bytes))
    }
}

/// `s` without a leading `0x` or `0X`.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for [u8; 32] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = MerkleTreeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Two-to-one node combinator.
///
/// Implementations must be deterministic and free of side effects: a full
/// tree and a partial tree only agree on their roots if both hash the same
/// way. Any `Fn(&Digest, &Digest) -> Digest` closure is a hasher.
pub trait MerkleHasher {
    /// Hash a left and a right child into their parent.
    fn hash(&self, left: &Digest, right: &Digest) -> Digest;
}

impl<F> MerkleHasher for F
where
    F: Fn(&Digest, &Digest) -> Digest,
{
    fn hash(&self, left: &Digest, right: &Digest) -> Digest {
        self(left, right)
    }
}

/// Default hasher: `blake3(left || right)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl MerkleHasher for Blake3Hasher {
    fn hash(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Digest(*hasher.finalize().as_bytes())
    }
}

/// Validate that `levels` is in `[1, MAX_LEVELS]`.
pub(crate) fn validate_levels(levels: usize) -> Result<()> {
    if levels == 0 || levels > MAX_LEVELS || levels >= usize::BITS as usize {
        return Err(MerkleTreeError::InvalidLevels {
            levels,
            max: MAX_LEVELS,
        });
    }
    Ok(())
}

/// Number of leaves a tree of the given depth holds. `levels` must already be
/// validated.
pub(crate) fn capacity_for_levels(levels: usize) -> usize {
    1usize << levels
}

/// Per-level hashes of an all-empty subtree, `levels + 1` entries.
///
/// `zeros[0]` is the zero element's digest and every following entry hashes
/// the previous one with itself.
pub(crate) fn zero_hashes<H: MerkleHasher>(hasher: &H, zero: Digest, levels: usize) -> Vec<Digest> {
    let mut zeros = Vec::with_capacity(levels + 1);
    zeros.push(zero);
    for level in 1..=levels {
        let below = zeros[level - 1];
        zeros.push(hasher.hash(&below, &below));
    }
    zeros
}
