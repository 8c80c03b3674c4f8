//! Published-status holder
//!
//! The process-wide read slot for the aggregated platform status. It is
//! written only by the status coordinator; everyone else reads. The slot
//! is replaced atomically (last publish wins) and reads take no locks, so
//! callers - including constraints evaluating inside a refresh pass - can
//! consult it freely without deadlock concerns.

use arc_swap::ArcSwapOption;
use cascade_core::status::Status;
use std::sync::Arc;

/// Lock-free slot holding the most recently published aggregate status.
///
/// `None` until the first refresh pass completes.
pub struct StatusHolder {
    current: ArcSwapOption<Status>,
}

impl Default for StatusHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHolder {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// The most recently published status, if any.
    pub fn current(&self) -> Option<Arc<Status>> {
        self.current.load_full()
    }

    /// Replace the published status. Coordinator-only.
    pub(crate) fn publish(&self, status: Status) {
        self.current.store(Some(Arc::new(status)));
    }
}
