//! Core types and traits for Cascade
//!
//! This crate defines the foundational types used throughout the system:
//! - CompoundKey: compound preference key codec (child path + entry key)
//! - Scope: the two-tier precedence order (Primary, Fallback)
//! - ContextPath: hierarchical context addressing for scoped overrides
//! - Severity / Status: aggregable status tree published by health refresh
//! - CancelToken: cooperative cancellation for constraint evaluation
//! - Error: error type hierarchy
//! - Traits: collaborator seams (PreferenceStore, PreferenceNode,
//!   Constraint, ValueSealer)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod context;
pub mod error;
pub mod key;
pub mod scope;
pub mod status;
pub mod traits;

// Re-export commonly used types and traits
pub use cancel::CancelToken;
pub use context::ContextPath;
pub use error::{Error, Result};
pub use key::CompoundKey;
pub use scope::Scope;
pub use status::{Severity, Status};
pub use traits::{Constraint, PreferenceNode, PreferenceStore, ValueSealer};
