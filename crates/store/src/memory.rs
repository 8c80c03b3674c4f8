//! In-memory hierarchical preference store
//!
//! The bundled [`PreferenceStore`] implementation. Node data lives in a
//! single concurrent table keyed by normalized absolute path:
//!
//! - DashMap: sharded by default, lock-free reads, per-shard writes
//! - FxHashMap: O(1) entry lookups, fast non-crypto hash
//!
//! Node handles are stateless facades over the shared table - cheap to
//! clone, safe to share across threads. Creating a node creates its
//! missing ancestors, so the tree never has dangling interior paths.

use cascade_core::error::Result;
use cascade_core::traits::{PreferenceNode, PreferenceStore};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

/// Normalize an absolute node path: split on `/`, drop empty segments,
/// rejoin. The root normalizes to the empty string.
fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Default)]
struct StoreInner {
    /// Entries per existing node, keyed by normalized absolute path.
    /// Presence of a key means the node exists, even with no entries.
    /// The root node is implicit and never stored.
    nodes: DashMap<String, FxHashMap<String, String>>,
}

/// In-memory hierarchical preference store.
///
/// `MemoryStore` is `Send + Sync`; clones share the same tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of existing nodes (excluding the implicit root).
    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }
}

impl PreferenceStore for MemoryStore {
    fn node(&self, path: &str) -> Result<Arc<dyn PreferenceNode>> {
        let path = normalize(path);
        if !path.is_empty() {
            // Materialize every ancestor prefix, then the node itself, so
            // the tree never has dangling interior paths.
            for (i, b) in path.bytes().enumerate() {
                if b == b'/' {
                    ensure_node(&self.inner, &path[..i]);
                }
            }
            ensure_node(&self.inner, &path);
        }
        Ok(Arc::new(MemoryNode {
            inner: Arc::clone(&self.inner),
            path,
        }))
    }

    fn node_exists(&self, path: &str) -> Result<bool> {
        let path = normalize(path);
        // The root always exists.
        Ok(path.is_empty() || self.inner.nodes.contains_key(&path))
    }
}

fn ensure_node(inner: &StoreInner, path: &str) {
    if !inner.nodes.contains_key(path) {
        trace!(path, "creating preference node");
        inner.nodes.entry(path.to_string()).or_default();
    }
}

struct MemoryNode {
    inner: Arc<StoreInner>,
    path: String,
}

impl PreferenceNode for MemoryNode {
    fn path(&self) -> &str {
        &self.path
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .inner
            .nodes
            .get(&self.path)
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .nodes
            .entry(self.path.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if let Some(mut entries) = self.inner.nodes.get_mut(&self.path) {
            entries.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .inner
            .nodes
            .get(&self.path)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn flush(&self) -> Result<()> {
        // Nothing to sync for the in-memory tree.
        Ok(())
    }
}
