//! Preference scopes
//!
//! A scope is a named precedence tier of the preference tree. The platform
//! defines exactly two: `Primary` (the read/write target) and `Fallback`
//! (read-only shipped defaults). Reads consult scopes in canonical order;
//! writes only ever land in `Primary`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A precedence tier of the preference tree.
///
/// The declaration order is the canonical resolution order: `Primary`
/// outranks `Fallback` as a whole, regardless of context specificity
/// within each scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Mutable tier holding user and installation settings.
    Primary,
    /// Read-only tier holding shipped defaults.
    Fallback,
}

impl Scope {
    /// All scopes in canonical resolution order.
    pub const ALL: [Scope; 2] = [Scope::Primary, Scope::Fallback];

    /// Stable name used as the scope's root segment in node paths.
    pub fn name(&self) -> &'static str {
        match self {
            Scope::Primary => "primary",
            Scope::Fallback => "fallback",
        }
    }

    /// Whether writes may target this scope.
    ///
    /// `Fallback` is read-only; the write path never computes a node there.
    pub fn is_writable(&self) -> bool {
        matches!(self, Scope::Primary)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
