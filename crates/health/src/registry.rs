//! Constraint registry
//!
//! Tracks the live set of pluggable platform constraints. Membership is a
//! set keyed by instance identity: registering the same `Arc` twice is a
//! no-op, and distinct instances are distinct members even when they
//! compare equal otherwise.
//!
//! The registry never evaluates constraints itself and never manages
//! their lifetime - it only tracks membership. `snapshot()` hands out a
//! point-in-time copy so an in-flight evaluation can iterate safely while
//! providers register and unregister concurrently: a constraint is
//! evaluated exactly once per refresh against the snapshot it was in.

use cascade_core::traits::Constraint;
use parking_lot::Mutex;
use std::sync::Arc;

/// Identity-keyed membership set of platform constraints.
#[derive(Default)]
pub struct ConstraintRegistry {
    constraints: Mutex<Vec<Arc<dyn Constraint>>>,
}

impl ConstraintRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint. Returns `true` when membership changed, `false`
    /// when this exact instance was already registered.
    pub fn register(&self, constraint: Arc<dyn Constraint>) -> bool {
        let mut constraints = self.constraints.lock();
        if constraints.iter().any(|c| Arc::ptr_eq(c, &constraint)) {
            return false;
        }
        constraints.push(constraint);
        true
    }

    /// Remove a constraint. Returns `true` when membership changed.
    pub fn unregister(&self, constraint: &Arc<dyn Constraint>) -> bool {
        let mut constraints = self.constraints.lock();
        let before = constraints.len();
        constraints.retain(|c| !Arc::ptr_eq(c, constraint));
        constraints.len() != before
    }

    /// Point-in-time copy of the membership, in registration order.
    /// Iterating the copy is unaffected by concurrent mutation.
    pub fn snapshot(&self) -> Vec<Arc<dyn Constraint>> {
        self.constraints.lock().clone()
    }

    /// Current number of registered constraints.
    pub fn len(&self) -> usize {
        self.constraints.lock().len()
    }

    /// True when no constraints are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::cancel::CancelToken;
    use cascade_core::error::Result;
    use cascade_core::status::Status;

    struct NamedConstraint(&'static str);

    impl Constraint for NamedConstraint {
        fn name(&self) -> &str {
            self.0
        }
        fn evaluate(&self, _cancel: &CancelToken) -> Result<Option<Status>> {
            Ok(Some(Status::ok()))
        }
    }

    #[test]
    fn test_register_is_idempotent_per_instance() {
        let registry = ConstraintRegistry::new();
        let c: Arc<dyn Constraint> = Arc::new(NamedConstraint("a"));
        assert!(registry.register(c.clone()));
        assert!(!registry.register(c.clone()));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn test_distinct_instances_are_distinct_members() {
        let registry = ConstraintRegistry::new();
        registry.register(Arc::new(NamedConstraint("a")));
        registry.register(Arc::new(NamedConstraint("a")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_reports_membership_change() {
        let registry = ConstraintRegistry::new();
        let c: Arc<dyn Constraint> = Arc::new(NamedConstraint("a"));
        registry.register(c.clone());
        assert!(registry.unregister(&c));
        assert!(!registry.unregister(&c));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let registry = ConstraintRegistry::new();
        registry.register(Arc::new(NamedConstraint("first")));
        registry.register(Arc::new(NamedConstraint("second")));
        registry.register(Arc::new(NamedConstraint("third")));
        let snapshot = registry.snapshot();
        let names: Vec<&str> = snapshot.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_mutation() {
        let registry = ConstraintRegistry::new();
        let c: Arc<dyn Constraint> = Arc::new(NamedConstraint("a"));
        registry.register(c.clone());
        let snapshot = registry.snapshot();
        registry.unregister(&c);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
