//! Cache Store
//!
//! Per-key bounded history of past invocations, consumed by the cache
//! node. Each entry is the transformed token list of one invocation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub trait CacheStore: Send + Sync {
    /// The stored history for a key, oldest first.
    fn history(&self, key: &str) -> Vec<Vec<String>>;
    /// Append an entry, dropping the oldest entries past `cap`.
    fn append(&self, key: &str, entry: Vec<String>, cap: usize);
    fn mark_changed(&self);
    fn changed(&self) -> bool;
}

type CacheMap = IndexMap<String, Vec<Vec<String>>>;

/// In-memory store, used in tests and by hosts without persistence.
#[derive(Default)]
pub struct MemoryCache {
    map: Mutex<CacheMap>,
    changed: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(key: &str, entries: &[&[&str]]) -> Self {
        let cache = Self::new();
        {
            let mut map = cache.map.lock().unwrap();
            map.insert(
                key.to_string(),
                entries
                    .iter()
                    .map(|e| e.iter().map(|t| t.to_string()).collect())
                    .collect(),
            );
        }
        cache
    }
}

impl CacheStore for MemoryCache {
    fn history(&self, key: &str) -> Vec<Vec<String>> {
        self.map.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    fn append(&self, key: &str, entry: Vec<String>, cap: usize) {
        let mut map = self.map.lock().unwrap();
        let history = map.entry(key.to_string()).or_default();
        history.push(entry);
        if history.len() > cap {
            let drop = history.len() - cap;
            history.drain(..drop);
        }
    }

    fn mark_changed(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    fn changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }
}

#[derive(Serialize, Deserialize, Default)]
struct CacheFile {
    caches: CacheMap,
}

/// JSON-file-backed store. Loaded eagerly; the host calls `flush` when the
/// invocation ends and `changed` reports true.
pub struct JsonFileCache {
    path: std::path::PathBuf,
    inner: MemoryCache,
}

impl JsonFileCache {
    pub fn load(path: impl Into<std::path::PathBuf>) -> Result<Self, std::io::Error> {
        let path = path.into();
        let map: CacheMap = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let file: CacheFile = serde_json::from_str(&content)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                file.caches
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheMap::default(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            inner: MemoryCache {
                map: Mutex::new(map),
                changed: AtomicBool::new(false),
            },
        })
    }

    pub fn flush(&self) -> Result<(), std::io::Error> {
        if !self.inner.changed() {
            return Ok(());
        }
        let file = CacheFile {
            caches: self.inner.map.lock().unwrap().clone(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, content)?;
        self.inner.changed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl CacheStore for JsonFileCache {
    fn history(&self, key: &str) -> Vec<Vec<String>> {
        self.inner.history(key)
    }

    fn append(&self, key: &str, entry: Vec<String>, cap: usize) {
        self.inner.append(key, entry, cap)
    }

    fn mark_changed(&self) {
        self.inner.mark_changed()
    }

    fn changed(&self) -> bool {
        self.inner.changed()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_append_and_history() {
        let cache = MemoryCache::new();
        cache.append("money", entry(&["usd", "1"]), 10);
        cache.append("money", entry(&["eur", "2"]), 10);
        assert_eq!(cache.history("money"), vec![entry(&["usd", "1"]), entry(&["eur", "2"])]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let cache = MemoryCache::new();
        for i in 0..5 {
            cache.append("k", entry(&[&i.to_string()]), 3);
        }
        assert_eq!(cache.history("k"), vec![entry(&["2"]), entry(&["3"]), entry(&["4"])]);
    }

    #[test]
    fn test_changed_flag() {
        let cache = MemoryCache::new();
        assert!(!cache.changed());
        cache.mark_changed();
        assert!(cache.changed());
    }
}
