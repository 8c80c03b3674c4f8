//! Scope resolution engine
//!
//! Resolves a logical preference key to a concrete value by walking an
//! ordered set of scopes and context-path ancestors.
//!
//! ## Precedence law
//!
//! For a read, candidate nodes are collected in this order:
//!
//! 1. For each scope in canonical order (`Primary`, then `Fallback`):
//!    a. If a non-root context was supplied: the node at
//!       `scope/qualifier/ancestor[/child_path]` for each context ancestor,
//!       most specific first - only if that node exists.
//!    b. The scope's own root-level node `scope/qualifier[/child_path]`,
//!       only if it exists.
//! 2. The first candidate that actually contains the entry key wins.
//!
//! The precedence is two-level: scope-major (all of `Primary` outranks all
//! of `Fallback`), context-minor (more specific context wins within a
//! scope). Writes never search - they compute exactly one deterministic
//! node in `Primary`, creating intermediates as needed.
//!
//! ## Failure policy
//!
//! Store failures while probing or reading a candidate degrade to
//! "candidate not found" and resolution moves on; if every candidate
//! fails, the caller's default is returned. Only the write path surfaces
//! store errors.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cascade_core::context::ContextPath;
use cascade_core::error::Result;
use cascade_core::key::CompoundKey;
use cascade_core::scope::Scope;
use cascade_core::traits::{PreferenceNode, PreferenceStore, ValueSealer};
use std::sync::Arc;
use tracing::debug;

/// Build the absolute store path for one candidate node.
fn node_path(scope: Scope, qualifier: &str, context: Option<&[String]>, child_path: &str) -> String {
    let mut path = String::from(scope.name());
    path.push('/');
    path.push_str(qualifier);
    if let Some(segments) = context {
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
    }
    if !child_path.is_empty() {
        path.push('/');
        path.push_str(child_path);
    }
    path
}

/// Resolves preference keys against a hierarchical store.
///
/// The engine is a stateless facade over a store handle: cheap to clone,
/// safe to share across threads, holding no caches of its own.
#[derive(Clone)]
pub struct ResolutionEngine {
    store: Arc<dyn PreferenceStore>,
    sealer: Option<Arc<dyn ValueSealer>>,
}

impl ResolutionEngine {
    /// Create an engine over the given store, with no sealer installed.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            sealer: None,
        }
    }

    /// Create an engine that routes encrypted writes through `sealer`.
    pub fn with_sealer(store: Arc<dyn PreferenceStore>, sealer: Arc<dyn ValueSealer>) -> Self {
        Self {
            store,
            sealer: Some(sealer),
        }
    }

    /// Collect the ordered candidate nodes for a read, per the precedence
    /// law. Only nodes that exist are returned; an empty list means "no
    /// value defined anywhere".
    pub fn read_candidates(
        &self,
        qualifier: &str,
        key: &str,
        context: Option<&ContextPath>,
    ) -> Vec<Arc<dyn PreferenceNode>> {
        let compound = CompoundKey::decode(key);
        let context = context.filter(|c| !c.is_root());
        let mut candidates: Vec<Arc<dyn PreferenceNode>> = Vec::new();
        for scope in Scope::ALL {
            if let Some(ctx) = context {
                for ancestor in ctx.ancestors() {
                    let path = node_path(scope, qualifier, Some(ancestor), &compound.child_path);
                    self.probe(&path, &mut candidates);
                }
            }
            let path = node_path(scope, qualifier, None, &compound.child_path);
            self.probe(&path, &mut candidates);
        }
        candidates
    }

    /// Append the node at `path` to `candidates` if it exists. Store
    /// failures degrade to "not a candidate".
    fn probe(&self, path: &str, candidates: &mut Vec<Arc<dyn PreferenceNode>>) {
        match self.store.node_exists(path) {
            Ok(true) => match self.store.node(path) {
                Ok(node) => candidates.push(node),
                Err(e) => debug!(path, error = %e, "candidate node unavailable; skipping"),
            },
            Ok(false) => {}
            Err(e) => debug!(path, error = %e, "candidate probe failed; skipping"),
        }
    }

    /// Resolve a string value: the first candidate containing the entry
    /// key wins; otherwise the caller's default is returned.
    pub fn get_string(
        &self,
        qualifier: &str,
        key: &str,
        default: Option<&str>,
        context: Option<&ContextPath>,
    ) -> Option<String> {
        let compound = CompoundKey::decode(key);
        for node in self.read_candidates(qualifier, key, context) {
            match node.get(&compound.leaf_key) {
                Ok(Some(raw)) => match self.open_value(raw) {
                    Ok(value) => return Some(value),
                    Err(e) => {
                        debug!(path = node.path(), error = %e, "stored value unreadable; skipping candidate");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    debug!(path = node.path(), error = %e, "candidate read failed; skipping");
                }
            }
        }
        default.map(str::to_string)
    }

    /// Compute the single deterministic write target for a key: always in
    /// `Primary`, under the context path when one is supplied. Creates
    /// intermediate nodes as needed.
    pub fn write_target(
        &self,
        qualifier: &str,
        key: &str,
        context: Option<&ContextPath>,
    ) -> Result<Arc<dyn PreferenceNode>> {
        let compound = CompoundKey::decode(key);
        let context = context.filter(|c| !c.is_root()).map(ContextPath::segments);
        let path = node_path(Scope::Primary, qualifier, context, &compound.child_path);
        self.store.node(&path)
    }

    /// Write a string value and flush the target node.
    ///
    /// With `encrypt` set, the value passes through the installed
    /// [`ValueSealer`] before it lands in the tree; when no sealer is
    /// installed the value is stored as-is.
    pub fn put_string(
        &self,
        qualifier: &str,
        key: &str,
        value: &str,
        context: Option<&ContextPath>,
        encrypt: bool,
    ) -> Result<()> {
        let compound = CompoundKey::decode(key);
        let node = self.write_target(qualifier, key, context)?;
        let stored = if encrypt {
            self.seal_value(value)?
        } else {
            value.to_string()
        };
        node.put(&compound.leaf_key, &stored)?;
        node.flush()
    }

    /// Remove the entry from its write-target node.
    pub fn remove(
        &self,
        qualifier: &str,
        key: &str,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        let compound = CompoundKey::decode(key);
        let node = self.write_target(qualifier, key, context)?;
        node.remove(&compound.leaf_key)?;
        node.flush()
    }

    fn seal_value(&self, plaintext: &str) -> Result<String> {
        match &self.sealer {
            Some(sealer) => sealer.seal(plaintext),
            None => {
                debug!("encrypted write requested without a sealer installed; storing as-is");
                Ok(plaintext.to_string())
            }
        }
    }

    fn open_value(&self, stored: String) -> Result<String> {
        match &self.sealer {
            Some(sealer) => sealer.open(&stored),
            None => Ok(stored),
        }
    }

    /// Resolve a boolean. Parse failure falls back to `default`, silently.
    pub fn get_bool(
        &self,
        qualifier: &str,
        key: &str,
        default: bool,
        context: Option<&ContextPath>,
    ) -> bool {
        self.get_string(qualifier, key, None, context)
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(default)
    }

    /// Write a boolean in its canonical textual form.
    pub fn put_bool(
        &self,
        qualifier: &str,
        key: &str,
        value: bool,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.put_string(qualifier, key, if value { "true" } else { "false" }, context, false)
    }

    /// Resolve a 32-bit integer. Parse failure falls back to `default`.
    pub fn get_i32(
        &self,
        qualifier: &str,
        key: &str,
        default: i32,
        context: Option<&ContextPath>,
    ) -> i32 {
        self.get_string(qualifier, key, None, context)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(default)
    }

    /// Write a 32-bit integer in its canonical textual form.
    pub fn put_i32(
        &self,
        qualifier: &str,
        key: &str,
        value: i32,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.put_string(qualifier, key, &value.to_string(), context, false)
    }

    /// Resolve a 64-bit integer. Parse failure falls back to `default`.
    pub fn get_i64(
        &self,
        qualifier: &str,
        key: &str,
        default: i64,
        context: Option<&ContextPath>,
    ) -> i64 {
        self.get_string(qualifier, key, None, context)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default)
    }

    /// Write a 64-bit integer in its canonical textual form.
    pub fn put_i64(
        &self,
        qualifier: &str,
        key: &str,
        value: i64,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.put_string(qualifier, key, &value.to_string(), context, false)
    }

    /// Resolve a 64-bit float. Parse failure falls back to `default`.
    ///
    /// The textual form is Rust's locale-independent shortest round-trip
    /// representation.
    pub fn get_f64(
        &self,
        qualifier: &str,
        key: &str,
        default: f64,
        context: Option<&ContextPath>,
    ) -> f64 {
        self.get_string(qualifier, key, None, context)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default)
    }

    /// Write a 64-bit float in its canonical textual form.
    pub fn put_f64(
        &self,
        qualifier: &str,
        key: &str,
        value: f64,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.put_string(qualifier, key, &value.to_string(), context, false)
    }

    /// Resolve a byte-array value transported as base64 text. Decode
    /// failure falls back to `default`, like any other parse failure.
    pub fn get_bytes(
        &self,
        qualifier: &str,
        key: &str,
        default: Option<&[u8]>,
        context: Option<&ContextPath>,
    ) -> Option<Vec<u8>> {
        match self.get_string(qualifier, key, None, context) {
            Some(text) => BASE64
                .decode(text.trim())
                .ok()
                .or_else(|| default.map(<[u8]>::to_vec)),
            None => default.map(<[u8]>::to_vec),
        }
    }

    /// Write a byte-array value as base64 text. `None` removes the entry
    /// rather than storing an empty value.
    pub fn put_bytes(
        &self,
        qualifier: &str,
        key: &str,
        value: Option<&[u8]>,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        match value {
            Some(bytes) => {
                self.put_string(qualifier, key, &BASE64.encode(bytes), context, false)
            }
            None => self.remove(qualifier, key, context),
        }
    }
}
