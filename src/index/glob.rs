//! Hierarchical glob patterns.
//!
//! Patterns are dot-split into segments before matching; `*` stands for
//! exactly one segment and never crosses the delimiter. Everything else
//! is a literal. The richer glob metacharacters (`?`, `[...]`, `{...}`)
//! are not supported and are rejected at parse time so a query error
//! surfaces to the caller instead of silently matching nothing.

use crate::core::error::{MetridexError, Result};
use crate::core::types::{MetricName, NAME_DELIMITER};

/// One parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches a segment with exactly this text.
    Literal(String),
    /// Matches any single segment.
    Any,
}

/// A parsed glob pattern, ready for segment-by-segment matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a pattern string.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(MetridexError::pattern("pattern cannot be empty"));
        }
        let mut segments = Vec::new();
        for token in pattern.split(NAME_DELIMITER) {
            if token.is_empty() {
                return Err(MetridexError::pattern(format!(
                    "pattern has an empty segment: {:?}",
                    pattern
                )));
            }
            if token == "*" {
                segments.push(Segment::Any);
                continue;
            }
            if token
                .chars()
                .any(|c| matches!(c, '*' | '?' | '[' | ']' | '{' | '}'))
            {
                return Err(MetridexError::pattern(format!(
                    "unsupported glob syntax in segment {:?}",
                    token
                )));
            }
            segments.push(Segment::Literal(token.to_string()));
        }
        Ok(Pattern { segments })
    }

    /// The parsed segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern contains no wildcard segments.
    ///
    /// An exact pattern degenerates to a plain path lookup.
    pub fn is_exact(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Matches a full metric name against this pattern.
    pub fn matches(&self, name: &MetricName) -> bool {
        let mut segs = self.segments.iter();
        for part in name.segments() {
            match segs.next() {
                Some(Segment::Any) => {},
                Some(Segment::Literal(lit)) if lit == part => {},
                _ => return false,
            }
        }
        segs.next().is_none()
    }
}
