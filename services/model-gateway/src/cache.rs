//! Process-lifetime memoization of resolved models.
//!
//! Keys are the configured URI *before* alias resolution. Entries never expire; `clear` is the
//! only invalidation. Two requests missing on the same key may both resolve and both insert;
//! the later write wins and both carry the same result.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Descriptor of a resolved model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelRecord {
    pub uri: String,
    pub loaded: bool,
    /// Feature count advertised by model metadata. Nothing populates it yet.
    pub expected_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub model: ModelRecord,
    /// URI actually used (versioned when an alias was rewritten).
    pub uri: String,
    /// Training run behind `uri`, looked up once when the entry is filled.
    pub run_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct ModelCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl ModelCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> { self.entries.read().get(key).cloned() }

    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        self.entries.write().insert(key.into(), entry.clone());
        entry
    }

    pub fn clear(&self) -> usize {
        let mut w = self.entries.write();
        let n = w.len();
        w.clear();
        n
    }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uri: &str) -> CacheEntry {
        CacheEntry { model: ModelRecord { uri: uri.into(), loaded: true, expected_features: None }, uri: uri.into(), run_id: None }
    }

    #[test]
    fn hit_returns_same_object() {
        let cache = ModelCache::new();
        let stored = cache.insert("models:/M@prod", entry("models:/M/5"));
        let hit = cache.get("models:/M@prod").unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));
        assert!(cache.get("models:/M/5").is_none());
    }

    #[test]
    fn clear_empties_everything() {
        let cache = ModelCache::new();
        cache.insert("a", entry("a"));
        cache.insert("b", entry("b"));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }
}
