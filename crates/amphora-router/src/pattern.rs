//! Compiled route patterns.

use std::fmt;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal segment that must match exactly.
    Static(String),
    /// Named parameter capturing a single path segment (`:id`).
    Param(String),
    /// Named rest parameter capturing the remaining path (`*slug`).
    Rest(String),
}

/// A successful pattern match.
///
/// Captures are the values of the pattern's `:param` and `*rest`
/// segments, in pattern order. Parameter extraction (mapping captures
/// back to names) is left to the route part that owns the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    captures: Vec<String>,
}

impl PatternMatch {
    /// Get a capture by position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(|s| s.as_str())
    }

    /// All captured values in pattern order.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }
}

/// A compiled route pattern.
///
/// Compiled once at startup from manifest data and immutable afterwards.
/// Matching is side-effect-free and safe to call concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a pattern from its path grammar.
    ///
    /// `:name` compiles to a parameter segment, `*name` to a rest
    /// segment; anything else is a literal. A rest segment only makes
    /// sense in last position; later segments are never reached.
    pub fn parse(path: &str) -> Self {
        let segments = split_path(path)
            .into_iter()
            .map(|seg| {
                if let Some(name) = seg.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if let Some(name) = seg.strip_prefix('*') {
                    Segment::Rest(name.to_string())
                } else {
                    Segment::Static(seg.to_string())
                }
            })
            .collect();

        Self {
            source: path.to_string(),
            segments,
        }
    }

    /// The path grammar this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check whether the pattern matches a request path.
    pub fn test(&self, path: &str) -> bool {
        self.exec(path).is_some()
    }

    /// Match a request path, returning the captured values.
    ///
    /// Returns `None` when the path does not match. A rest segment
    /// captures the remaining path joined with `/`, and matches even
    /// when the remainder is empty.
    pub fn exec(&self, path: &str) -> Option<PatternMatch> {
        let parts = split_path(path);
        let mut captures = Vec::new();
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if parts.get(i).map(|p| p.as_str()) != Some(expected.as_str()) {
                        return None;
                    }
                    i += 1;
                }
                Segment::Param(_) => {
                    let value = parts.get(i)?;
                    captures.push(value.clone());
                    i += 1;
                }
                Segment::Rest(_) => {
                    captures.push(parts[i..].join("/"));
                    i = parts.len();
                }
            }
        }

        if i == parts.len() {
            Some(PatternMatch { captures })
        } else {
            None
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Split a path into its non-empty segments.
fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
