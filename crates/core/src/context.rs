//! Hierarchical context paths
//!
//! A context path addresses a position in a hierarchical space - for
//! example a tenant/application hierarchy - and scopes configuration
//! overrides more specifically than the qualifier alone. The root is the
//! empty path. Context paths are supplied per call by the caller and never
//! persisted by this subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of path segments in a hierarchical addressing space.
///
/// Resolution walks a context from its most specific position up towards -
/// but never including - the root, so that more specific overrides win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPath {
    segments: Vec<String>,
}

impl ContextPath {
    /// The root context (empty segment sequence).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a context from pre-split segments. Empty segments are dropped.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parse a `/`-delimited context path. Leading, trailing, and repeated
    /// slashes are tolerated and never produce empty segments.
    pub fn parse(text: &str) -> Self {
        Self::new(text.split('/'))
    }

    /// True for the empty (root) context.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path segments in order, most general first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Iterate the ancestor prefixes from the full path up to - but not
    /// including - the root, most specific first.
    ///
    /// For `[a, b, c]` this yields `[a, b, c]`, `[a, b]`, `[a]`.
    pub fn ancestors(&self) -> impl Iterator<Item = &[String]> {
        (1..=self.segments.len())
            .rev()
            .map(move |len| &self.segments[..len])
    }
}

impl fmt::Display for ContextPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
