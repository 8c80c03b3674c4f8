//! Cooperative cancellation token
//!
//! Cancellation in this system is cooperative, not preemptive: a token is
//! handed to long-running work, which observes it at safe boundaries
//! (between constraint evaluations). Cancelling never interrupts work
//! mid-step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable cancellation flag.
///
/// Clones share the same underlying flag; cancelling any clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
