//! Leaf values and their canonical encoding.

use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::{Digest, hash::strip_hex_prefix};

/// An opaque leaf value.
///
/// Equality is strict: `Number(10)` and `Text("a")` are different elements
/// even though both encode to the same digest. Use
/// [`Element::same_digest`] with `index_of_by` when encoded equality is
/// wanted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(untagged)]
pub enum Element {
    Number(u64),
    /// Hex text (optionally `0x` prefixed) is read as a number; any other
    /// text is encoded through its UTF-8 bytes.
    Text(String),
    Bytes(Vec<u8>),
}

impl Element {
    /// `true` for `Text("")` and `Bytes([])`. Bulk insertion skips these.
    pub fn is_empty(&self) -> bool {
        match self {
            Element::Number(_) => false,
            Element::Text(s) => s.is_empty(),
            Element::Bytes(b) => b.is_empty(),
        }
    }

    /// The layer-0 node for this element.
    ///
    /// The element is read as a big-endian value, left-padded with zeros to
    /// 32 bytes; longer values keep their low-order 32 bytes.
    pub fn digest(&self) -> Digest {
        let mut out = [0u8; 32];
        match self {
            Element::Number(n) => out[24..].copy_from_slice(&n.to_be_bytes()),
            Element::Text(s) => match hex_value(s) {
                Some(bytes) => right_align(&bytes, &mut out),
                None => right_align(s.as_bytes(), &mut out),
            },
            Element::Bytes(b) => right_align(b, &mut out),
        }
        Digest::new(out)
    }

    /// Comparator matching elements by encoded value rather than variant.
    pub fn same_digest(stored: &Element, target: &Element) -> bool {
        stored.digest() == target.digest()
    }
}

/// The value of `s` if it is a non-empty hex literal, limited to its
/// rightmost 64 digits.
fn hex_value(s: &str) -> Option<Vec<u8>> {
    let digits = strip_hex_prefix(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let tail = &digits[digits.len().saturating_sub(64)..];
    if tail.len() % 2 == 1 {
        hex::decode(format!("0{}", tail)).ok()
    } else {
        hex::decode(tail).ok()
    }
}

fn right_align(bytes: &[u8], out: &mut [u8; 32]) {
    let take = bytes.len().min(32);
    out[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Number(n) => write!(f, "{}", n),
            Element::Text(s) => f.write_str(s),
            Element::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

impl From<u64> for Element {
    fn from(n: u64) -> Self {
        Element::Number(n)
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::Text(s.to_owned())
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::Text(s)
    }
}

impl From<Vec<u8>> for Element {
    fn from(b: Vec<u8>) -> Self {
        Element::Bytes(b)
    }
}
