//! Cache entries and content references

use crate::cache::key::CompositeKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a materialized layer result, issued by the executor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Wrap an executor-issued handle
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw handle
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored layer result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key the result was stored under
    pub key: CompositeKey,
    /// Result of executing the layer
    pub content: ContentRef,
    /// When the entry was stored
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new entry stamped with the current time
    pub fn new(key: CompositeKey, content: ContentRef) -> Self {
        Self {
            key,
            content,
            created_at: Utc::now(),
        }
    }

    /// Check if this entry is older than the given number of days
    pub fn is_older_than_days(&self, days: u32) -> bool {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        self.created_at < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::SEED;
    use crate::hash::ContentHasher;

    fn entry() -> CacheEntry {
        let key = CompositeKey::combine(
            SEED,
            ContentHasher::digest("install-deps"),
            ContentHasher::digest("manifest"),
        );
        CacheEntry::new(key, ContentRef::new("sha256:abc"))
    }

    #[test]
    fn fresh_entry_is_not_old() {
        assert!(!entry().is_older_than_days(1));
    }

    #[test]
    fn backdated_entry_is_old() {
        let mut e = entry();
        e.created_at = Utc::now() - chrono::Duration::days(40);
        assert!(e.is_older_than_days(30));
        assert!(!e.is_older_than_days(60));
    }

    #[test]
    fn content_ref_is_transparent() {
        let json = serde_json::to_string(&ContentRef::new("layer-1")).unwrap();
        assert_eq!(json, r#""layer-1""#);
    }
}
