//! Platform handle
//!
//! [`Platform`] is the explicit startup/teardown handle that wires the
//! preference store, the preference service, and the health monitor
//! together. There is deliberately no global singleton: whoever hosts the
//! platform constructs a `Platform`, passes it (or its parts) to the
//! components that need it, and tears it down explicitly. Calls against a
//! torn-down handle fail with a distinct "not active" error instead of a
//! null-pointer fault.

use cascade_core::status::Severity;
use cascade_core::traits::{PreferenceStore, ValueSealer};
use cascade_health::HealthMonitor;
use cascade_resolve::PreferenceService;
use cascade_store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The assembled platform: preference resolution plus health monitoring.
///
/// Construct, call [`Platform::activate`], use, then
/// [`Platform::shutdown`]. All parts are safe to use from any thread.
pub struct Platform {
    preferences: Arc<PreferenceService>,
    health: HealthMonitor,
}

impl Platform {
    /// Assemble a platform over the bundled in-memory store with default
    /// settings.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Assemble a platform over a caller-supplied store.
    pub fn with_store(store: Arc<dyn PreferenceStore>) -> Self {
        Self::assemble(PreferenceService::new(store), HealthMonitor::new())
    }

    /// Assemble a platform with every collaborator supplied: store,
    /// optional sealer for encrypted writes, and the health refresh
    /// debounce delay.
    pub fn with_options(
        store: Arc<dyn PreferenceStore>,
        sealer: Option<Arc<dyn ValueSealer>>,
        refresh_delay: Duration,
    ) -> Self {
        let preferences = match sealer {
            Some(sealer) => PreferenceService::with_sealer(store, sealer),
            None => PreferenceService::new(store),
        };
        Self::assemble(preferences, HealthMonitor::with_refresh_delay(refresh_delay))
    }

    fn assemble(preferences: PreferenceService, health: HealthMonitor) -> Self {
        Self {
            preferences: Arc::new(preferences),
            health,
        }
    }

    /// Bring the platform up: the preference service starts accepting
    /// operations and the health monitor starts honoring refresh
    /// triggers. Re-entrant.
    pub fn activate(&self) {
        self.preferences.activate();
        self.health.activate();
        info!("platform activated");
    }

    /// Tear the platform down. The preference service rejects further
    /// operations with a "not active" error and the health refresh
    /// worker is joined. Re-activation is not supported after shutdown.
    pub fn shutdown(&self) {
        self.preferences.shutdown();
        self.health.shutdown();
        info!("platform shut down");
    }

    /// The preference service handle.
    pub fn preferences(&self) -> &Arc<PreferenceService> {
        &self.preferences
    }

    /// The health monitor.
    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Whether first-run setup should be offered to the user.
    ///
    /// True until a refresh pass has published a status, and again
    /// whenever the current aggregate is `Error`-severity. This reads the
    /// lock-free status slot, so constraints may call it - or resolve
    /// preferences - during their own evaluation without deadlocking the
    /// refresh pass.
    pub fn setup_required(&self) -> bool {
        match self.health.current_status() {
            None => true,
            Some(status) => status.severity == Severity::Error,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}
