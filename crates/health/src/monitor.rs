//! Health monitor facade
//!
//! Composes the constraint registry, the status holder, and the
//! coordinator into the surface the rest of the platform sees. Constraint
//! provider discovery delivers `constraint_added` / `constraint_removed`
//! callbacks here; every successful membership change triggers one
//! (coalesced) refresh. The monitor exposes exactly those two entry
//! points plus `snapshot`, alongside lifecycle control and the published
//! status.

use crate::coordinator::{RefreshWait, StatusCoordinator, DEFAULT_REFRESH_DELAY};
use crate::holder::StatusHolder;
use crate::registry::ConstraintRegistry;
use cascade_core::status::Status;
use cascade_core::traits::Constraint;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for platform health monitoring.
///
/// Starts disabled; call [`HealthMonitor::activate`] once the platform is
/// up. Dropping the monitor shuts the refresh worker down.
pub struct HealthMonitor {
    registry: Arc<ConstraintRegistry>,
    holder: Arc<StatusHolder>,
    coordinator: StatusCoordinator,
}

impl HealthMonitor {
    /// Create a monitor with the default debounce delay.
    pub fn new() -> Self {
        Self::with_refresh_delay(DEFAULT_REFRESH_DELAY)
    }

    /// Create a monitor with a custom debounce delay.
    pub fn with_refresh_delay(delay: Duration) -> Self {
        let registry = Arc::new(ConstraintRegistry::new());
        let holder = Arc::new(StatusHolder::new());
        let coordinator = StatusCoordinator::new(registry.clone(), holder.clone(), delay);
        Self {
            registry,
            holder,
            coordinator,
        }
    }

    /// Enable status refreshes. Re-entrant.
    pub fn activate(&self) {
        self.coordinator.activate();
    }

    /// Disable refreshes without blocking; see
    /// [`StatusCoordinator::disable`].
    pub fn disable(&self) {
        self.coordinator.disable();
    }

    /// Terminal teardown; joins the refresh worker.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }

    /// Discovery callback: a constraint provider appeared. Triggers a
    /// refresh when membership actually changed.
    pub fn constraint_added(&self, constraint: Arc<dyn Constraint>) {
        if self.registry.register(constraint) {
            self.coordinator.schedule_refresh();
        }
    }

    /// Discovery callback: a constraint provider went away. Triggers a
    /// refresh when membership actually changed.
    pub fn constraint_removed(&self, constraint: &Arc<dyn Constraint>) {
        if self.registry.unregister(constraint) {
            self.coordinator.schedule_refresh();
        }
    }

    /// Point-in-time copy of the registered constraints.
    pub fn snapshot(&self) -> Vec<Arc<dyn Constraint>> {
        self.registry.snapshot()
    }

    /// Manually request a refresh (coalesced like any other trigger).
    pub fn schedule_refresh(&self) {
        self.coordinator.schedule_refresh();
    }

    /// Block until the in-flight refresh (if any) completes; see
    /// [`StatusCoordinator::wait_for_refresh`].
    pub fn wait_for_refresh(&self, timeout: Duration) -> RefreshWait {
        self.coordinator.wait_for_refresh(timeout)
    }

    /// The most recently published aggregate status.
    pub fn current_status(&self) -> Option<Arc<Status>> {
        self.holder.current()
    }

    /// The shared read slot, for components that want to poll it
    /// directly.
    pub fn status_holder(&self) -> &Arc<StatusHolder> {
        &self.holder
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
