//! Compound preference key codec
//!
//! A compound key addresses a value relative to a scope node: an optional
//! child-node path followed by the entry key under that node. The textual
//! format is wire-visible and frozen:
//!
//! - No slash: the whole key is the entry key, child path is empty.
//! - A double slash (`//`) splits the key at its first occurrence: everything
//!   before it (minus a single leading slash) is the child path, everything
//!   after it is the entry key taken verbatim - including any further
//!   slashes or double slashes.
//! - Single slashes only: a `/`-delimited path whose last segment is the
//!   entry key and whose preceding segments form the child path.
//! - A leading slash on the whole key is stripped; it never produces an
//!   empty first segment.
//!
//! Decoding is a total function - every string decodes to some `CompoundKey`.

use std::fmt;

/// Decomposition of a compound preference key into a child-node path and
/// the entry key under that node.
///
/// # Examples
///
/// ```
/// use cascade_core::key::CompoundKey;
///
/// assert_eq!(CompoundKey::decode("color"), CompoundKey::new("", "color"));
/// assert_eq!(CompoundKey::decode("editor/font"), CompoundKey::new("editor", "font"));
/// assert_eq!(CompoundKey::decode("a/b//c/d"), CompoundKey::new("a/b", "c/d"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundKey {
    /// Path of the child node relative to the scope node, `/`-delimited.
    /// Empty when the entry lives directly on the scope node.
    pub child_path: String,
    /// Entry key under the addressed node, taken verbatim.
    pub leaf_key: String,
}

impl CompoundKey {
    /// Create a decomposition from its parts.
    pub fn new(child_path: impl Into<String>, leaf_key: impl Into<String>) -> Self {
        Self {
            child_path: child_path.into(),
            leaf_key: leaf_key.into(),
        }
    }

    /// Decode a compound key string.
    ///
    /// The double-slash scan runs on the raw input; the leading-slash strip
    /// applies to the child-path prefix only. This ordering is load-bearing:
    /// `"///a"` must decode to an empty child path and the entry key `"/a"`.
    pub fn decode(key: &str) -> Self {
        if let Some(split) = key.find("//") {
            let prefix = &key[..split];
            let child = prefix.strip_prefix('/').unwrap_or(prefix);
            return Self::new(child, &key[split + 2..]);
        }
        let key = key.strip_prefix('/').unwrap_or(key);
        match key.rfind('/') {
            Some(idx) => Self::new(&key[..idx], &key[idx + 1..]),
            None => Self::new("", key),
        }
    }

    /// Re-encode the decomposition into compound-key text.
    ///
    /// Decoding the result yields an equal decomposition for every value
    /// `decode` can produce. An entry key containing slashes is guarded by
    /// an explicit double-slash separator so it survives the round trip.
    pub fn encode(&self) -> String {
        if self.child_path.is_empty() {
            if self.leaf_key.contains('/') {
                format!("//{}", self.leaf_key)
            } else {
                self.leaf_key.clone()
            }
        } else {
            format!("{}//{}", self.child_path, self.leaf_key)
        }
    }

    /// True when the entry lives directly on the scope node.
    pub fn is_direct(&self) -> bool {
        self.child_path.is_empty()
    }
}

impl fmt::Display for CompoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
