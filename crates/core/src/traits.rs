//! Core trait definitions
//!
//! These traits are the seams between the subsystems and their external
//! collaborators:
//!
//! - [`PreferenceStore`] / [`PreferenceNode`]: the hierarchical key/value
//!   tree consulted and mutated by the resolution engine. The bundled
//!   in-memory implementation lives in `cascade-store`; production
//!   deployments may back it with anything that honors node semantics.
//! - [`Constraint`]: a pluggable platform check contributing one status
//!   node to the aggregated health status.
//! - [`ValueSealer`]: optional hook through which encrypted writes pass;
//!   the sealing algorithm itself is external to this subsystem.

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::status::Status;
use std::sync::Arc;

/// A node in the hierarchical preference tree.
///
/// Nodes hold string-valued entries and are addressed by `/`-delimited
/// absolute paths. Handles are cheap to clone and safe to share across
/// threads; consistency across concurrent mutation is the store's own
/// contract.
pub trait PreferenceNode: Send + Sync {
    /// Absolute `/`-delimited path of this node.
    fn path(&self) -> &str;

    /// Read an entry. `Ok(None)` means the entry is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write an entry, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove an entry. Removing an absent entry is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Names of the entries currently present on this node.
    fn keys(&self) -> Result<Vec<String>>;

    /// Make pending writes durable. A no-op for purely in-memory stores.
    fn flush(&self) -> Result<()>;
}

/// The hierarchical preference store consulted by the resolution engine.
pub trait PreferenceStore: Send + Sync {
    /// Return the node at the given absolute path, creating it and any
    /// missing intermediate nodes.
    fn node(&self, path: &str) -> Result<Arc<dyn PreferenceNode>>;

    /// Whether a node exists at the given absolute path, without creating
    /// anything. Non-existence is "no candidate" to the resolution engine,
    /// never an error.
    fn node_exists(&self, path: &str) -> Result<bool>;
}

/// A pluggable platform constraint check.
///
/// Constraints are registered and unregistered at runtime by external
/// providers. They are stateless from the coordinator's point of view and
/// must be safe to evaluate from a background thread.
pub trait Constraint: Send + Sync {
    /// Short stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Evaluate the constraint.
    ///
    /// `Ok(Some(status))` contributes one node to the aggregate;
    /// `Ok(None)` contributes nothing. An `Err` aborts the current refresh
    /// pass (it is logged, never propagated to callers). A fatal but
    /// evaluable condition should be reported as an `Error`-severity
    /// status instead of an `Err`.
    ///
    /// Long-running checks should observe `cancel` and return early -
    /// the result of a cancelled pass is discarded.
    fn evaluate(&self, cancel: &CancelToken) -> Result<Option<Status>>;
}

/// Hook through which encrypted preference writes pass.
///
/// The platform treats encryption as an external concern: when a caller
/// requests an encrypted write, the engine hands the plaintext to the
/// installed sealer and stores whatever comes back. `open` must be total
/// over stored values - a sealer recognizes its own framing and returns
/// unsealed input unchanged.
pub trait ValueSealer: Send + Sync {
    /// Transform a plaintext value for storage.
    fn seal(&self, plaintext: &str) -> Result<String>;

    /// Reverse [`ValueSealer::seal`]. Values not produced by this sealer
    /// are returned unchanged.
    fn open(&self, stored: &str) -> Result<String>;
}
