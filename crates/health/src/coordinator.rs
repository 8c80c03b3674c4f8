//! Debounced single-flight status coordinator
//!
//! Re-evaluates the registered platform constraints and publishes the
//! aggregated status. Two guarantees define this component:
//!
//! - **Single-flight**: at most one refresh is pending or running at any
//!   time, enforced by a one-permit gate (the run state itself). A
//!   `schedule_refresh` that cannot take the gate is a silent no-op; the
//!   in-flight run picks up the latest constraint set when it executes.
//! - **Debounce**: an acquired refresh executes after a fixed short delay,
//!   so a burst of registration changes collapses into one evaluation.
//!
//! The evaluation body runs on a dedicated worker thread. Cancellation is
//! cooperative and checked between constraints; `disable()` never blocks
//! and never interrupts a constraint mid-evaluation - it only suppresses
//! publishing and prevents new passes.

use crate::holder::StatusHolder;
use crate::registry::ConstraintRegistry;
use cascade_core::cancel::CancelToken;
use cascade_core::status::Status;
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Debounce window between a granted `schedule_refresh` and the start of
/// its evaluation pass.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Outcome of [`StatusCoordinator::wait_for_refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshWait {
    /// The pending or running refresh (if any) has completed.
    Completed,
    /// The timeout elapsed while a refresh was still in flight.
    TimedOut,
    /// The coordinator is disabled; there is nothing to wait for.
    NotApplicable,
}

/// Run state of the coordinator. `Idle` means the one-permit gate is
/// available; `Pending`/`Running` mean it is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Pending { due: Instant },
    Running,
}

struct Shared {
    state: Mutex<RunState>,
    /// Wakes the worker when a refresh is scheduled or shutdown begins.
    wake: Condvar,
    /// Wakes `wait_for_refresh` callers when the gate returns to `Idle`.
    settled: Condvar,
    enabled: AtomicBool,
    shutdown: AtomicBool,
    /// Cancellation token of the in-flight pass, if any.
    active_cancel: Mutex<Option<CancelToken>>,
    delay: Duration,
}

impl Shared {
    fn pass_cancelled(&self, token: &CancelToken) -> bool {
        token.is_cancelled()
            || !self.enabled.load(Ordering::Acquire)
            || self.shutdown.load(Ordering::Acquire)
    }
}

/// Debounced, single-flight refresh engine for the platform status.
///
/// Starts disabled; `activate()` enables refresh requests. `shutdown()`
/// is terminal and joins the worker thread.
pub struct StatusCoordinator {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl StatusCoordinator {
    /// Create a coordinator over the given registry and holder, spawning
    /// its worker thread. The coordinator starts disabled.
    pub fn new(
        registry: Arc<ConstraintRegistry>,
        holder: Arc<StatusHolder>,
        delay: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(RunState::Idle),
            wake: Condvar::new(),
            settled: Condvar::new(),
            enabled: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            active_cancel: Mutex::new(None),
            delay,
        });

        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("cascade-health".to_string())
            .spawn(move || worker_loop(&worker_shared, &registry, &holder))
            .expect("failed to spawn health refresh worker thread");

        Self {
            shared,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Enable refresh requests. Re-entrant; ignored after shutdown.
    pub fn activate(&self) {
        if !self.shared.shutdown.load(Ordering::Acquire) {
            self.shared.enabled.store(true, Ordering::Release);
        }
    }

    /// Disable the coordinator without blocking.
    ///
    /// A pending run is abandoned immediately; a running pass is marked
    /// for cancellation and will stop at its next constraint boundary
    /// without publishing. The previously published status is untouched.
    pub fn disable(&self) {
        self.shared.enabled.store(false, Ordering::Release);
        if let Some(token) = self.shared.active_cancel.lock().as_ref() {
            token.cancel();
        }
        let mut state = self.shared.state.lock();
        if matches!(*state, RunState::Pending { .. }) {
            *state = RunState::Idle;
        }
        // Notify under the lock so neither the worker nor a waiter caught
        // between its flag check and its wait can miss the transition.
        self.shared.wake.notify_all();
        self.shared.settled.notify_all();
    }

    /// Request a refresh.
    ///
    /// Takes the one-permit gate and arms the debounce timer, or - when a
    /// refresh is already pending or running - does nothing. Returns
    /// whether a new run was actually scheduled; callers that only want
    /// the side effect can ignore the result.
    pub fn schedule_refresh(&self) -> bool {
        if !self.shared.enabled.load(Ordering::Acquire)
            || self.shared.shutdown.load(Ordering::Acquire)
        {
            return false;
        }
        let mut state = self.shared.state.lock();
        match *state {
            RunState::Idle => {
                *state = RunState::Pending {
                    due: Instant::now() + self.shared.delay,
                };
                self.shared.wake.notify_one();
                true
            }
            // Gate held: the in-flight run will observe the latest
            // constraint snapshot when it executes.
            RunState::Pending { .. } | RunState::Running => false,
        }
    }

    /// Block until the pending/running refresh (if any) completes, the
    /// timeout elapses, or the coordinator turns out to be disabled.
    ///
    /// This is a pure peek on the gate: it only ever reads the run state
    /// and can never start a refresh itself.
    pub fn wait_for_refresh(&self, timeout: Duration) -> RefreshWait {
        if !self.shared.enabled.load(Ordering::Acquire) {
            return RefreshWait::NotApplicable;
        }
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if !self.shared.enabled.load(Ordering::Acquire) {
                return RefreshWait::NotApplicable;
            }
            if matches!(*state, RunState::Idle) {
                return RefreshWait::Completed;
            }
            if self
                .shared
                .settled
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return if matches!(*state, RunState::Idle) {
                    RefreshWait::Completed
                } else {
                    RefreshWait::TimedOut
                };
            }
        }
    }

    /// Terminal teardown: disable, cancel any in-flight pass, and join
    /// the worker thread. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.enabled.store(false, Ordering::Release);
        if let Some(token) = self.shared.active_cancel.lock().as_ref() {
            token.cancel();
        }
        {
            // Lock before notifying: the worker checks the shutdown flag
            // under this lock before waiting, so it either sees the flag
            // or is already waiting and receives the notification.
            let mut state = self.shared.state.lock();
            if matches!(*state, RunState::Pending { .. }) {
                *state = RunState::Idle;
            }
            self.shared.wake.notify_all();
            self.shared.settled.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// RAII guard returning the one-permit gate on every exit path.
///
/// Without this guard, a panicking constraint would leave the state at
/// `Running` forever and no refresh could ever be scheduled again.
struct SettleGuard<'a> {
    shared: &'a Shared,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        *state = RunState::Idle;
        // Notify under the lock so a waiter between its state check and
        // its wait cannot miss the transition back to Idle.
        self.shared.settled.notify_all();
    }
}

fn worker_loop(shared: &Shared, registry: &ConstraintRegistry, holder: &StatusHolder) {
    loop {
        // Wait for a due refresh request.
        {
            let mut state = shared.state.lock();
            loop {
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                match *state {
                    RunState::Idle | RunState::Running => {
                        shared.wake.wait(&mut state);
                    }
                    RunState::Pending { due } => {
                        if Instant::now() < due {
                            // Debounce window still open; later triggers
                            // within it coalesce into this run.
                            shared.wake.wait_until(&mut state, due);
                        } else if shared.enabled.load(Ordering::Acquire) {
                            *state = RunState::Running;
                            break;
                        } else {
                            // Disabled while pending: abandon without
                            // evaluating, leave the status untouched.
                            *state = RunState::Idle;
                            shared.settled.notify_all();
                        }
                    }
                }
            }
        }

        let settle = SettleGuard { shared };
        let token = CancelToken::new();
        *shared.active_cancel.lock() = Some(token.clone());

        // catch_unwind keeps a panicking constraint from killing the
        // worker; the guard returns the gate either way.
        let outcome = catch_unwind(AssertUnwindSafe(|| evaluate_pass(shared, registry, &token)));
        match outcome {
            Ok(Some(status)) => holder.publish(status),
            Ok(None) => debug!("refresh pass aborted; previous status kept"),
            Err(payload) => error!(
                "constraint evaluation panicked: {:?}",
                payload
                    .downcast_ref::<&str>()
                    .copied()
                    .unwrap_or("(non-string panic)")
            ),
        }

        *shared.active_cancel.lock() = None;
        drop(settle);
    }
}

/// Evaluate one refresh pass. Returns the aggregate to publish, or `None`
/// when the pass was cancelled or a constraint failed.
fn evaluate_pass(
    shared: &Shared,
    registry: &ConstraintRegistry,
    token: &CancelToken,
) -> Option<Status> {
    let snapshot = registry.snapshot();
    if snapshot.is_empty() {
        return Some(Status::ok());
    }

    let mut children = Vec::with_capacity(snapshot.len());
    for constraint in &snapshot {
        // Cancellation is cooperative: observed between constraints,
        // never mid-evaluation.
        if shared.pass_cancelled(token) {
            debug!("refresh pass cancelled between constraints");
            return None;
        }
        match constraint.evaluate(token) {
            Ok(Some(status)) => children.push(status),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    constraint = constraint.name(),
                    error = %e,
                    "constraint failed; aborting refresh pass"
                );
                return None;
            }
        }
    }
    if shared.pass_cancelled(token) {
        return None;
    }
    Some(Status::aggregate("platform constraints", children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::error::{Error, Result};
    use cascade_core::status::Severity;
    use cascade_core::traits::Constraint;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    const TEST_DELAY: Duration = Duration::from_millis(20);
    const SETTLE: Duration = Duration::from_secs(5);

    fn coordinator() -> (StatusCoordinator, Arc<ConstraintRegistry>, Arc<StatusHolder>) {
        let registry = Arc::new(ConstraintRegistry::new());
        let holder = Arc::new(StatusHolder::new());
        let coordinator = StatusCoordinator::new(registry.clone(), holder.clone(), TEST_DELAY);
        (coordinator, registry, holder)
    }

    struct CountingConstraint {
        evals: Arc<AtomicUsize>,
        status: Status,
    }

    impl CountingConstraint {
        fn arcs(status: Status) -> (Arc<dyn Constraint>, Arc<AtomicUsize>) {
            let evals = Arc::new(AtomicUsize::new(0));
            let constraint = Arc::new(CountingConstraint {
                evals: evals.clone(),
                status,
            });
            (constraint, evals)
        }
    }

    impl Constraint for CountingConstraint {
        fn name(&self) -> &str {
            "counting"
        }
        fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
            self.evals.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.status.clone()))
        }
    }

    /// Blocks inside evaluate until released, so tests can hold a pass
    /// open deterministically.
    struct BlockingConstraint {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
        evals: Arc<AtomicUsize>,
    }

    impl Constraint for BlockingConstraint {
        fn name(&self) -> &str {
            "blocking"
        }
        fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
            self.evals.fetch_add(1, Ordering::SeqCst);
            self.entered.wait();
            self.release.wait();
            Ok(Some(Status::ok()))
        }
    }

    struct FailingConstraint;

    impl Constraint for FailingConstraint {
        fn name(&self) -> &str {
            "failing"
        }
        fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
            Err(Error::Constraint("probe exploded".to_string()))
        }
    }

    struct PanickingConstraint;

    impl Constraint for PanickingConstraint {
        fn name(&self) -> &str {
            "panicking"
        }
        fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
            panic!("intentional test panic");
        }
    }

    #[test]
    fn test_empty_registry_publishes_ok() {
        let (coordinator, _registry, holder) = coordinator();
        coordinator.activate();
        assert!(coordinator.schedule_refresh());
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        let status = holder.current().expect("status published");
        assert!(status.is_ok());
        coordinator.shutdown();
    }

    #[test]
    fn test_refresh_aggregates_in_snapshot_order() {
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        let (warn, _) = CountingConstraint::arcs(Status::warning("disk space low"));
        let (ok, _) = CountingConstraint::arcs(Status::ok());
        registry.register(warn);
        registry.register(ok);

        coordinator.schedule_refresh();
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);

        let status = holder.current().expect("status published");
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.children.len(), 2);
        assert_eq!(status.children[0].message, "disk space low");
        assert_eq!(status.children[1].severity, Severity::Ok);
        coordinator.shutdown();
    }

    #[test]
    fn test_burst_of_schedules_collapses_into_one_pass() {
        let (coordinator, registry, _holder) = coordinator();
        coordinator.activate();
        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);

        // All of these land inside one debounce window.
        for _ in 0..10 {
            coordinator.schedule_refresh();
        }
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        coordinator.shutdown();
    }

    #[test]
    fn test_concurrent_schedules_yield_one_pass() {
        let (coordinator, registry, _holder) = coordinator();
        coordinator.activate();
        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);

        let coordinator = Arc::new(coordinator);
        let start = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = Arc::clone(&coordinator);
            let start = Arc::clone(&start);
            handles.push(std::thread::spawn(move || {
                start.wait();
                coordinator.schedule_refresh();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        coordinator.shutdown();
    }

    #[test]
    fn test_schedule_while_running_is_a_silent_no_op() {
        let (coordinator, registry, _holder) = coordinator();
        coordinator.activate();
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let evals = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(BlockingConstraint {
            entered: entered.clone(),
            release: release.clone(),
            evals: evals.clone(),
        }));

        coordinator.schedule_refresh();
        entered.wait(); // pass is now running

        // The gate is held: no second run may be queued.
        assert!(!coordinator.schedule_refresh());
        assert!(!coordinator.schedule_refresh());

        release.wait();
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        coordinator.shutdown();
    }

    #[test]
    fn test_disable_while_pending_skips_evaluation() {
        // A wide debounce window makes "disable before the run is due"
        // deterministic even on a loaded machine.
        let registry = Arc::new(ConstraintRegistry::new());
        let holder = Arc::new(StatusHolder::new());
        let coordinator =
            StatusCoordinator::new(registry.clone(), holder.clone(), Duration::from_millis(300));
        coordinator.activate();
        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);

        coordinator.schedule_refresh();
        coordinator.disable(); // within the debounce window

        // Give the worker ample time to have acted if it were going to.
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(evals.load(Ordering::SeqCst), 0);
        assert!(holder.current().is_none());
        coordinator.shutdown();
    }

    #[test]
    fn test_disable_during_run_suppresses_publish() {
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        registry.register(Arc::new(BlockingConstraint {
            entered: entered.clone(),
            release: release.clone(),
            evals: Arc::new(AtomicUsize::new(0)),
        }));
        // A second constraint that must never run once disabled.
        let (tail, tail_evals) = CountingConstraint::arcs(Status::ok());
        registry.register(tail);

        coordinator.schedule_refresh();
        entered.wait();
        coordinator.disable(); // run is mid-pass; must not block
        release.wait();

        // The pass stops at the next constraint boundary and publishes
        // nothing.
        std::thread::sleep(TEST_DELAY * 5);
        assert!(holder.current().is_none());
        assert_eq!(tail_evals.load(Ordering::SeqCst), 0);
        coordinator.shutdown();
    }

    #[test]
    fn test_failing_constraint_aborts_pass_but_not_coordinator() {
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        let failing: Arc<dyn Constraint> = Arc::new(FailingConstraint);
        registry.register(failing.clone());

        coordinator.schedule_refresh();
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert!(holder.current().is_none());

        // The gate was released: a later refresh runs normally.
        registry.unregister(&failing);
        let (ok, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(ok);
        assert!(coordinator.schedule_refresh());
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        assert!(holder.current().unwrap().is_ok());
        coordinator.shutdown();
    }

    #[test]
    fn test_panicking_constraint_does_not_wedge_the_gate() {
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        let panicking: Arc<dyn Constraint> = Arc::new(PanickingConstraint);
        registry.register(panicking.clone());

        coordinator.schedule_refresh();
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert!(holder.current().is_none());

        registry.unregister(&panicking);
        assert!(coordinator.schedule_refresh());
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert!(holder.current().unwrap().is_ok());
        coordinator.shutdown();
    }

    #[test]
    fn test_wait_when_disabled_is_not_applicable_immediately() {
        let (coordinator, _registry, _holder) = coordinator();
        let started = Instant::now();
        assert_eq!(
            coordinator.wait_for_refresh(Duration::from_secs(30)),
            RefreshWait::NotApplicable
        );
        assert!(started.elapsed() < Duration::from_secs(1));
        coordinator.shutdown();
    }

    #[test]
    fn test_wait_with_nothing_in_flight_completes_immediately() {
        let (coordinator, _registry, _holder) = coordinator();
        coordinator.activate();
        assert_eq!(
            coordinator.wait_for_refresh(Duration::from_millis(1)),
            RefreshWait::Completed
        );
        coordinator.shutdown();
    }

    #[test]
    fn test_wait_never_starts_a_refresh() {
        // The wait is a pure peek on the gate: even many concurrent
        // waiters must not trigger an evaluation pass.
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);

        let coordinator = Arc::new(coordinator);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let coordinator = Arc::clone(&coordinator);
            handles.push(std::thread::spawn(move || {
                coordinator.wait_for_refresh(Duration::from_millis(50))
            }));
        }
        for h in handles {
            assert_eq!(h.join().unwrap(), RefreshWait::Completed);
        }
        assert_eq!(evals.load(Ordering::SeqCst), 0);
        assert!(holder.current().is_none());
        coordinator.shutdown();
    }

    #[test]
    fn test_wait_times_out_while_pass_is_held_open() {
        let (coordinator, registry, _holder) = coordinator();
        coordinator.activate();
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        registry.register(Arc::new(BlockingConstraint {
            entered: entered.clone(),
            release: release.clone(),
            evals: Arc::new(AtomicUsize::new(0)),
        }));

        coordinator.schedule_refresh();
        entered.wait();
        assert_eq!(
            coordinator.wait_for_refresh(Duration::from_millis(20)),
            RefreshWait::TimedOut
        );
        release.wait();
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        coordinator.shutdown();
    }

    #[test]
    fn test_schedule_before_activation_is_ignored() {
        let (coordinator, registry, holder) = coordinator();
        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);

        assert!(!coordinator.schedule_refresh());
        std::thread::sleep(TEST_DELAY * 5);
        assert_eq!(evals.load(Ordering::SeqCst), 0);
        assert!(holder.current().is_none());
        coordinator.shutdown();
    }

    #[test]
    fn test_shutdown_is_terminal_and_idempotent() {
        let (coordinator, _registry, _holder) = coordinator();
        coordinator.activate();
        coordinator.shutdown();
        coordinator.shutdown();
        coordinator.activate();
        assert!(!coordinator.schedule_refresh());
    }

    #[test]
    fn test_reactivation_after_disable_resumes_refreshes() {
        let (coordinator, registry, holder) = coordinator();
        coordinator.activate();
        coordinator.disable();
        coordinator.activate();

        let (constraint, evals) = CountingConstraint::arcs(Status::ok());
        registry.register(constraint);
        assert!(coordinator.schedule_refresh());
        assert_eq!(coordinator.wait_for_refresh(SETTLE), RefreshWait::Completed);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        assert!(holder.current().unwrap().is_ok());
        coordinator.shutdown();
    }
}
