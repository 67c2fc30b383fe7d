//! Attribute glob type and matching
//!
//! An attribute glob is a dot-separated path naming data fields:
//! - `name` (a single top-level field, with everything below it)
//! - `account.*` (every field below `account`)
//! - `*` (every field)
//! - `!password` (negation, removes the field from what is otherwise allowed)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Glob wildcard segment
pub const WILDCARD: &str = "*";

/// Errors that can occur while parsing attribute globs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    /// Empty glob string provided
    #[error("Attribute glob cannot be empty")]
    EmptyGlob,

    /// A path segment is empty (`a..b`, `a.`)
    #[error("Empty segment in attribute glob: '{0}'")]
    EmptySegment(String),

    /// Wildcard used as part of a segment (`acc*`)
    #[error("Wildcards must be standalone: '{0}'")]
    InvalidWildcard(String),

    /// A segment holds a control character
    #[error("Control character in attribute glob segment: {0:?}")]
    ControlCharacter(String),
}

/// A parsed attribute glob
///
/// # Examples
///
/// ```
/// use cretoai_access::notation::AttributeGlob;
///
/// let glob = AttributeGlob::parse("!account.password").unwrap();
/// assert!(glob.is_negated());
/// assert!(glob.covers(&["account", "password"]));
/// assert!(!glob.covers(&["account"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeGlob {
    /// Original glob string, trimmed
    raw: String,
    /// Parsed path segments (without the negation prefix)
    segments: Vec<String>,
    /// Whether the glob starts with `!`
    negated: bool,
}

/// Ordering key used to pick the glob that governs a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    depth: usize,
    literals: usize,
}

impl AttributeGlob {
    pub fn parse(s: &str) -> Result<Self, NotationError> {
        let raw = s.trim();
        let (negated, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };
        if body.is_empty() {
            return Err(NotationError::EmptyGlob);
        }

        let segments: Vec<String> = body.split('.').map(|s| s.trim().to_string()).collect();
        for segment in &segments {
            if segment.is_empty() {
                return Err(NotationError::EmptySegment(raw.to_string()));
            }
            if segment.contains('*') && segment != WILDCARD {
                return Err(NotationError::InvalidWildcard(segment.clone()));
            }
            if segment.chars().any(char::is_control) {
                return Err(NotationError::ControlCharacter(segment.clone()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            negated,
        })
    }

    /// Build a glob from already valid segments
    pub(crate) fn from_segments(segments: Vec<String>, negated: bool) -> Self {
        let body = segments.join(".");
        let raw = if negated { format!("!{}", body) } else { body };
        Self {
            raw,
            segments,
            negated,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn has_wildcards(&self) -> bool {
        self.segments.iter().any(|s| s == WILDCARD)
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            depth: self.segments.len(),
            literals: self.segments.iter().filter(|s| *s != WILDCARD).count(),
        }
    }

    /// Whether this glob covers `path` (and therefore everything below it)
    pub fn covers<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() <= path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(glob_seg, path_seg)| glob_seg == WILDCARD || glob_seg == path_seg.as_ref())
    }

    /// Whether this glob names something strictly below `path`
    pub fn reaches_below<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() > path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(glob_seg, path_seg)| glob_seg == WILDCARD || glob_seg == path_seg.as_ref())
    }

    /// Compare which of two covering globs governs a path. Deeper and more
    /// literal globs win; a negation wins over a positive of equal rank.
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.specificity()
            .cmp(&other.specificity())
            .then(self.negated.cmp(&other.negated))
    }

    /// Same polarity and same segments
    pub fn same_as(&self, other: &Self) -> bool {
        self.negated == other.negated && self.segments == other.segments
    }
}

impl FromStr for AttributeGlob {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AttributeGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
