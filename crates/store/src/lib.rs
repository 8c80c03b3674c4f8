//! In-memory preference store for Cascade
//!
//! Provides [`MemoryStore`], the bundled implementation of the
//! `cascade-core` store traits. Production deployments may substitute any
//! store honoring the same node semantics; everything above the store
//! traits is implementation-agnostic.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod memory;

pub use memory::MemoryStore;
