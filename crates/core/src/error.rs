//! Error types for the preference and health subsystems
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Note that most read-path failures are deliberately NOT
//! represented here: resolution swallows per-candidate store failures and
//! falls back to the caller's default. The variants below cover the cases
//! that callers must be able to distinguish.

use thiserror::Error;

/// Result type alias for cascade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the preference and health subsystems
#[derive(Debug, Error)]
pub enum Error {
    /// Operation invoked on a handle that has not been activated or has
    /// been torn down. This is a lifecycle/programming error, distinct
    /// from absent data, and is never silently defaulted.
    #[error("preference subsystem is not active")]
    NotActive,

    /// Backing store failure surfaced on the write path. On the read path
    /// the same condition degrades to "candidate not found" instead.
    #[error("preference store unavailable: {0}")]
    StoreUnavailable(String),

    /// A value sealer failed to seal or open a value.
    #[error("sealed value error: {0}")]
    Sealer(String),

    /// A constraint check could not be evaluated. Raised by constraint
    /// implementations; the coordinator converts it into an aborted
    /// refresh pass rather than propagating it.
    #[error("constraint evaluation failed: {0}")]
    Constraint(String),
}
