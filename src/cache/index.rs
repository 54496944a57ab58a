//! Cache index abstraction and the in-memory backend

use crate::cache::entry::{CacheEntry, ContentRef};
use crate::cache::key::CompositeKey;
use crate::error::{StrataError, StrataResult};
use crate::hash::Digest;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Abstract cache index
///
/// Callers construct one index and pass it by reference into each
/// plan/build, so tests can isolate themselves with a fresh
/// [`MemoryIndex`]. Implementations must make per-key operations atomic;
/// independent builds may share one index across threads.
pub trait CacheIndex: Send + Sync {
    /// Find the entry stored under `key`
    fn lookup(&self, key: &CompositeKey) -> StrataResult<Option<CacheEntry>>;

    /// Store a result under `key`, replacing any existing entry
    fn store(&self, key: &CompositeKey, content: ContentRef) -> StrataResult<CacheEntry>;

    /// Remove every entry matching `predicate`, returning how many were removed
    fn evict(&self, predicate: &dyn Fn(&CacheEntry) -> bool) -> StrataResult<usize>;

    /// All entries, in no particular order
    fn entries(&self) -> StrataResult<Vec<CacheEntry>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;

    /// Remove every entry
    fn clear(&self) -> StrataResult<usize> {
        self.evict(&|_| true)
    }
}

/// Process-local index backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<HashMap<Digest, CacheEntry>>,
}

impl MemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StrataError {
    StrataError::cache_unavailable("memory index lock poisoned")
}

impl CacheIndex for MemoryIndex {
    fn lookup(&self, key: &CompositeKey) -> StrataResult<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&key.digest()).cloned())
    }

    fn store(&self, key: &CompositeKey, content: ContentRef) -> StrataResult<CacheEntry> {
        let entry = CacheEntry::new(*key, content);
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.digest(), entry.clone());
        debug!("Stored {} -> {}", key, entry.content);
        Ok(entry)
    }

    fn evict(&self, predicate: &dyn Fn(&CacheEntry) -> bool) -> StrataResult<usize> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !predicate(entry));
        Ok(before - entries.len())
    }

    fn entries(&self) -> StrataResult<Vec<CacheEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
