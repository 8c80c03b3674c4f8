//! Preference service handle
//!
//! [`PreferenceService`] is the explicit lifecycle handle in front of the
//! resolution engine. It is constructed at platform startup, activated once
//! the subsystem is ready, and torn down explicitly on shutdown. Every
//! operation on a handle that is not active fails with
//! [`Error::NotActive`] - a lifecycle error is a programming mistake and
//! must not be masked by defaults the way absent data is.

use crate::engine::ResolutionEngine;
use cascade_core::context::ContextPath;
use cascade_core::error::{Error, Result};
use cascade_core::traits::{PreferenceStore, ValueSealer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle-guarded facade over [`ResolutionEngine`].
///
/// The handle starts inactive; `activate` and `shutdown` are re-entrant
/// and may be called from any thread.
pub struct PreferenceService {
    engine: ResolutionEngine,
    active: AtomicBool,
}

impl PreferenceService {
    /// Create an inactive service over the given store.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            engine: ResolutionEngine::new(store),
            active: AtomicBool::new(false),
        }
    }

    /// Create an inactive service whose encrypted writes pass through
    /// `sealer`.
    pub fn with_sealer(store: Arc<dyn PreferenceStore>, sealer: Arc<dyn ValueSealer>) -> Self {
        Self {
            engine: ResolutionEngine::with_sealer(store, sealer),
            active: AtomicBool::new(false),
        }
    }

    /// Mark the subsystem ready. Idempotent.
    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Tear the handle down. Idempotent; subsequent operations return
    /// [`Error::NotActive`].
    pub fn shutdown(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether the handle currently accepts operations.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn engine(&self) -> Result<&ResolutionEngine> {
        if self.is_active() {
            Ok(&self.engine)
        } else {
            Err(Error::NotActive)
        }
    }

    /// Resolve a string preference. See [`ResolutionEngine::get_string`].
    pub fn get_string(
        &self,
        qualifier: &str,
        key: &str,
        default: Option<&str>,
        context: Option<&ContextPath>,
    ) -> Result<Option<String>> {
        Ok(self.engine()?.get_string(qualifier, key, default, context))
    }

    /// Write a string preference. See [`ResolutionEngine::put_string`].
    pub fn put_string(
        &self,
        qualifier: &str,
        key: &str,
        value: &str,
        context: Option<&ContextPath>,
        encrypt: bool,
    ) -> Result<()> {
        self.engine()?
            .put_string(qualifier, key, value, context, encrypt)
    }

    /// Remove a preference entry from its write target.
    pub fn remove(
        &self,
        qualifier: &str,
        key: &str,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.remove(qualifier, key, context)
    }

    /// Resolve a boolean preference.
    pub fn get_bool(
        &self,
        qualifier: &str,
        key: &str,
        default: bool,
        context: Option<&ContextPath>,
    ) -> Result<bool> {
        Ok(self.engine()?.get_bool(qualifier, key, default, context))
    }

    /// Write a boolean preference.
    pub fn put_bool(
        &self,
        qualifier: &str,
        key: &str,
        value: bool,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.put_bool(qualifier, key, value, context)
    }

    /// Resolve a 32-bit integer preference.
    pub fn get_i32(
        &self,
        qualifier: &str,
        key: &str,
        default: i32,
        context: Option<&ContextPath>,
    ) -> Result<i32> {
        Ok(self.engine()?.get_i32(qualifier, key, default, context))
    }

    /// Write a 32-bit integer preference.
    pub fn put_i32(
        &self,
        qualifier: &str,
        key: &str,
        value: i32,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.put_i32(qualifier, key, value, context)
    }

    /// Resolve a 64-bit integer preference.
    pub fn get_i64(
        &self,
        qualifier: &str,
        key: &str,
        default: i64,
        context: Option<&ContextPath>,
    ) -> Result<i64> {
        Ok(self.engine()?.get_i64(qualifier, key, default, context))
    }

    /// Write a 64-bit integer preference.
    pub fn put_i64(
        &self,
        qualifier: &str,
        key: &str,
        value: i64,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.put_i64(qualifier, key, value, context)
    }

    /// Resolve a 64-bit float preference.
    pub fn get_f64(
        &self,
        qualifier: &str,
        key: &str,
        default: f64,
        context: Option<&ContextPath>,
    ) -> Result<f64> {
        Ok(self.engine()?.get_f64(qualifier, key, default, context))
    }

    /// Write a 64-bit float preference.
    pub fn put_f64(
        &self,
        qualifier: &str,
        key: &str,
        value: f64,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.put_f64(qualifier, key, value, context)
    }

    /// Resolve a byte-array preference.
    pub fn get_bytes(
        &self,
        qualifier: &str,
        key: &str,
        default: Option<&[u8]>,
        context: Option<&ContextPath>,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.engine()?.get_bytes(qualifier, key, default, context))
    }

    /// Write a byte-array preference; `None` removes the entry.
    pub fn put_bytes(
        &self,
        qualifier: &str,
        key: &str,
        value: Option<&[u8]>,
        context: Option<&ContextPath>,
    ) -> Result<()> {
        self.engine()?.put_bytes(qualifier, key, value, context)
    }
}
