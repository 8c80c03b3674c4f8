//! Cascade - scoped preference resolution and platform health monitoring
//!
//! Cascade provides two cooperating subsystems:
//!
//! - A **preference resolution engine** that resolves a logical key to a
//!   concrete value by walking scopes (`Primary` over `Fallback`) and
//!   context-path ancestors (most specific first).
//! - A **health monitor** that re-evaluates pluggable platform
//!   constraints on membership changes - debounced and single-flight -
//!   and publishes one aggregated, ready-to-render status.
//!
//! # Quick Start
//!
//! ```
//! use cascade::{ContextPath, Platform};
//!
//! let platform = Platform::new();
//! platform.activate();
//!
//! let prefs = platform.preferences();
//! let ctx = ContextPath::parse("tenant/app");
//! prefs.put_string("ui", "color", "blue", Some(&ctx), false)?;
//! assert_eq!(
//!     prefs.get_string("ui", "color", None, Some(&ctx))?,
//!     Some("blue".to_string())
//! );
//!
//! platform.shutdown();
//! # Ok::<(), cascade::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod platform;

pub use platform::Platform;

// Re-export the public API of the member crates.
pub use cascade_core::{
    CancelToken, CompoundKey, Constraint, ContextPath, Error, PreferenceNode, PreferenceStore,
    Result, Scope, Severity, Status, ValueSealer,
};
pub use cascade_health::{
    ConstraintRegistry, HealthMonitor, RefreshWait, StatusHolder, DEFAULT_REFRESH_DELAY,
};
pub use cascade_resolve::{PreferenceService, ResolutionEngine};
pub use cascade_store::MemoryStore;
