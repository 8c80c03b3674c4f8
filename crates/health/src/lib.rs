//! Platform health monitoring for Cascade
//!
//! This crate implements event-driven health status aggregation:
//! - ConstraintRegistry: live membership of pluggable platform checks
//! - StatusCoordinator: debounced, single-flight refresh engine
//! - StatusHolder: lock-free slot for the published aggregate status
//! - HealthMonitor: the composed facade the platform wires up
//!
//! Constraint providers register and unregister at runtime; each change
//! triggers a refresh that is debounced and single-flight, so bursts of
//! changes collapse into one evaluation pass and at most one pass is ever
//! in flight.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod coordinator;
mod holder;
mod monitor;
mod registry;

pub use coordinator::{RefreshWait, StatusCoordinator, DEFAULT_REFRESH_DELAY};
pub use holder::StatusHolder;
pub use monitor::HealthMonitor;
pub use registry::ConstraintRegistry;
