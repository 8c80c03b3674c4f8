//! End-to-end platform tests
//!
//! Exercises the assembled platform: preference resolution through the
//! service handle, health refresh through the monitor, and the feedback
//! loop between the two.

use cascade::{
    CancelToken, Constraint, ContextPath, Error, MemoryStore, Platform, PreferenceService,
    RefreshWait, Result, Severity, Status,
};
use std::sync::Arc;
use std::time::Duration;

const SETTLE: Duration = Duration::from_secs(5);

fn fast_platform() -> Platform {
    Platform::with_options(
        Arc::new(MemoryStore::new()),
        None,
        Duration::from_millis(20),
    )
}

struct FixedConstraint {
    name: &'static str,
    status: Status,
}

impl Constraint for FixedConstraint {
    fn name(&self) -> &str {
        self.name
    }
    fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
        Ok(Some(self.status.clone()))
    }
}

#[test]
fn test_put_then_get_with_compound_key_and_context() {
    let platform = fast_platform();
    platform.activate();
    let prefs = platform.preferences();
    let ctx = ContextPath::parse("tenant/app");

    prefs
        .put_string("q", "a/b//c", "v", Some(&ctx), false)
        .unwrap();
    // No fallback entry exists anywhere; the written primary value must
    // resolve on its own.
    assert_eq!(
        prefs.get_string("q", "a/b//c", None, Some(&ctx)).unwrap(),
        Some("v".to_string())
    );
    platform.shutdown();
}

#[test]
fn test_context_override_beats_scope_root() {
    let platform = fast_platform();
    platform.activate();
    let prefs = platform.preferences();
    let ctx = ContextPath::parse("tenant/app");

    prefs.put_string("q", "k", "global", None, false).unwrap();
    prefs
        .put_string("q", "k", "scoped", Some(&ctx), false)
        .unwrap();

    assert_eq!(
        prefs.get_string("q", "k", None, Some(&ctx)).unwrap(),
        Some("scoped".to_string())
    );
    // Without the context, only the scope root is consulted.
    assert_eq!(
        prefs.get_string("q", "k", None, None).unwrap(),
        Some("global".to_string())
    );
    platform.shutdown();
}

#[test]
fn test_health_aggregation_in_registration_order() {
    let platform = fast_platform();
    platform.activate();

    platform.health().constraint_added(Arc::new(FixedConstraint {
        name: "search-index",
        status: Status::warning("search index not built"),
    }));
    platform.health().constraint_added(Arc::new(FixedConstraint {
        name: "store",
        status: Status::ok(),
    }));

    assert_eq!(
        platform.health().wait_for_refresh(SETTLE),
        RefreshWait::Completed
    );
    let status = platform.health().current_status().expect("published");
    assert_eq!(status.severity, Severity::Warning);
    assert_eq!(status.children.len(), 2);
    assert_eq!(status.children[0].message, "search index not built");
    assert_eq!(status.children[1].severity, Severity::Ok);
    platform.shutdown();
}

#[test]
fn test_setup_required_tracks_published_status() {
    let platform = fast_platform();
    platform.activate();

    // Nothing published yet: setup is required.
    assert!(platform.setup_required());

    platform.health().constraint_added(Arc::new(FixedConstraint {
        name: "store",
        status: Status::ok(),
    }));
    assert_eq!(
        platform.health().wait_for_refresh(SETTLE),
        RefreshWait::Completed
    );
    assert!(!platform.setup_required());

    // An error-severity constraint flips it back.
    platform.health().constraint_added(Arc::new(FixedConstraint {
        name: "license",
        status: Status::error("no license configured"),
    }));
    assert_eq!(
        platform.health().wait_for_refresh(SETTLE),
        RefreshWait::Completed
    );
    assert!(platform.setup_required());
    platform.shutdown();
}

/// A constraint that resolves preferences while being evaluated - the
/// feedback loop between health refresh and resolution must not deadlock.
struct PreferenceBackedConstraint {
    prefs: Arc<PreferenceService>,
}

impl Constraint for PreferenceBackedConstraint {
    fn name(&self) -> &str {
        "preference-backed"
    }
    fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
        let configured = self.prefs.get_bool("setup", "completed", false, None)?;
        Ok(Some(if configured {
            Status::ok()
        } else {
            Status::warning("initial setup has not been completed")
        }))
    }
}

#[test]
fn test_constraint_may_resolve_preferences_without_deadlock() {
    let platform = fast_platform();
    platform.activate();
    let prefs = Arc::clone(platform.preferences());

    platform
        .health()
        .constraint_added(Arc::new(PreferenceBackedConstraint {
            prefs: prefs.clone(),
        }));
    assert_eq!(
        platform.health().wait_for_refresh(SETTLE),
        RefreshWait::Completed
    );
    let status = platform.health().current_status().expect("published");
    assert_eq!(status.severity, Severity::Warning);

    // Completing setup and re-evaluating clears the warning.
    prefs.put_bool("setup", "completed", true, None).unwrap();
    platform.health().schedule_refresh();
    assert_eq!(
        platform.health().wait_for_refresh(SETTLE),
        RefreshWait::Completed
    );
    assert!(platform.health().current_status().unwrap().is_ok());
    platform.shutdown();
}

#[test]
fn test_shutdown_makes_preferences_inactive() {
    let platform = fast_platform();
    platform.activate();
    let prefs = platform.preferences();
    prefs.put_string("q", "k", "v", None, false).unwrap();

    platform.shutdown();
    assert!(matches!(
        prefs.get_string("q", "k", None, None),
        Err(Error::NotActive)
    ));
}

#[test]
fn test_wait_after_disable_is_not_applicable() {
    let platform = fast_platform();
    platform.activate();
    platform.health().disable();
    assert_eq!(
        platform.health().wait_for_refresh(Duration::from_secs(30)),
        RefreshWait::NotApplicable
    );
    platform.shutdown();
}
