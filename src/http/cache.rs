//! Conditional request support for file replies

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Strong entity tag derived from the response bytes, stored quoted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag(String);

impl EntityTag {
    pub fn for_content(content: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self(format!("\"{:x}\"", hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an `If-None-Match` header value names this tag (or `*`)
    pub fn matches(&self, if_none_match: Option<&str>) -> bool {
        if_none_match.is_some_and(|header| {
            header
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == "*" || candidate == self.0)
        })
    }
}
