//! Aggregable status model
//!
//! A `Status` is an immutable tree describing the outcome of one or more
//! platform constraint checks. Aggregation is a pure function built
//! bottom-up from per-constraint results: the aggregate's severity is the
//! most severe of its children, and children preserve accumulation order.
//!
//! The published aggregate is the single, ready-to-render description of
//! any misconfiguration or not-yet-completed setup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a status node, least to most severe.
///
/// The derived ordering is relied upon by aggregation: `Ok < Info <
/// Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing to report.
    Ok,
    /// Informational note; the platform is fully usable.
    Info,
    /// Degraded but usable.
    Warning,
    /// Unusable until resolved.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Ok => "ok",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// An immutable, aggregable status tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Severity of this node. For aggregates, the most severe child.
    pub severity: Severity,
    /// Human-readable description, ready to render.
    pub message: String,
    /// Child statuses in accumulation order. Empty for leaf statuses.
    pub children: Vec<Status>,
}

impl Status {
    /// A leaf status with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            children: Vec::new(),
        }
    }

    /// An `Ok` leaf with an empty message.
    pub fn ok() -> Self {
        Self::new(Severity::Ok, "")
    }

    /// An `Info` leaf.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// A `Warning` leaf.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// An `Error` leaf.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Aggregate child statuses into one node.
    ///
    /// The aggregate's severity is the maximum severity among the children
    /// (`Ok` when there are none); the children are preserved in the order
    /// given.
    pub fn aggregate(message: impl Into<String>, children: Vec<Status>) -> Self {
        let severity = children
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(Severity::Ok);
        Self {
            severity,
            message: message.into(),
            children,
        }
    }

    /// True when this node and every descendant is `Ok`.
    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok && self.children.iter().all(Status::is_ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "[{}]", self.severity)
        } else {
            write!(f, "[{}] {}", self.severity, self.message)
        }
    }
}
