//! Route pattern matching
//!
//! Patterns are `/`-separated segments; a segment starting with `:` is a
//! named parameter. There is no wildcard, optional or regex segment. Mount
//! prefixes use the same decoded, segment-wise comparison.

use super::query::decode_or_raw;
use super::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern such as `/:word/echo`
    ///
    /// Literal segments are percent-decoded here so they compare against
    /// decoded path segments. A bare `:` is treated as a literal.
    pub fn compile(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(decode_or_raw(segment)),
            })
            .collect();

        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a concrete request path, returning the bound parameters
    ///
    /// Both sides must have the same number of segments. A parameter
    /// segment matches any non-empty path segment.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if decode_or_raw(part) != *literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), decode_or_raw(part));
                }
            }
        }
        Some(params)
    }
}

/// A mount prefix such as `/public`
#[derive(Debug, Clone)]
pub struct Prefix {
    source: String,
    /// Decoded, without empty segments; empty means the whole tree
    segments: Vec<String>,
}

impl Prefix {
    pub fn compile(prefix: &str) -> Self {
        Self {
            source: prefix.to_string(),
            segments: prefix
                .split('/')
                .filter(|s| !s.is_empty())
                .map(decode_or_raw)
                .collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Raw remainder of `path` after the prefix
    ///
    /// The remainder is empty or starts with `/`. `None` when the decoded
    /// leading segments differ from the prefix.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let mut rest = path;
        for expected in &self.segments {
            let after_slash = rest.strip_prefix('/')?;
            let (segment, tail) = after_slash
                .find('/')
                .map_or((after_slash, ""), |i| after_slash.split_at(i));
            if decode_or_raw(segment) != *expected {
                return None;
            }
            rest = tail;
        }
        Some(rest)
    }
}
