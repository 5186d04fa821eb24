//! Shortcut Store
//!
//! Persistent name → token-list mappings consumed by the shortcut node.
//! The engine reads and writes through the trait; the host owns locking
//! and flushes when `mark_changed` was signaled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named token lists, grouped per store name so several commands can share
/// one backing file.
pub trait ShortcutStore: Send + Sync {
    fn get(&self, store: &str, name: &str) -> Option<Vec<String>>;
    fn set(&self, store: &str, name: &str, tokens: Vec<String>);
    /// Returns whether the shortcut existed.
    fn delete(&self, store: &str, name: &str) -> bool;
    /// Shortcut names in insertion order.
    fn names(&self, store: &str) -> Vec<String>;
    /// Signal that the host should flush the store.
    fn mark_changed(&self);
    fn changed(&self) -> bool;
}

type ShortcutMap = IndexMap<String, IndexMap<String, Vec<String>>>;

/// In-memory store, used in tests and by hosts without persistence.
#[derive(Default)]
pub struct MemoryShortcuts {
    map: Mutex<ShortcutMap>,
    changed: AtomicBool,
}

impl MemoryShortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(store: &str, entries: &[(&str, &[&str])]) -> Self {
        let shortcuts = Self::new();
        for (name, tokens) in entries {
            shortcuts.set(store, name, tokens.iter().map(|t| t.to_string()).collect());
        }
        shortcuts.changed.store(false, Ordering::SeqCst);
        shortcuts
    }
}

impl ShortcutStore for MemoryShortcuts {
    fn get(&self, store: &str, name: &str) -> Option<Vec<String>> {
        self.map.lock().unwrap().get(store)?.get(name).cloned()
    }

    fn set(&self, store: &str, name: &str, tokens: Vec<String>) {
        self.map
            .lock()
            .unwrap()
            .entry(store.to_string())
            .or_default()
            .insert(name.to_string(), tokens);
        self.changed.store(true, Ordering::SeqCst);
    }

    fn delete(&self, store: &str, name: &str) -> bool {
        let removed = self
            .map
            .lock()
            .unwrap()
            .get_mut(store)
            .map(|m| m.shift_remove(name).is_some())
            .unwrap_or(false);
        if removed {
            self.changed.store(true, Ordering::SeqCst);
        }
        removed
    }

    fn names(&self, store: &str) -> Vec<String> {
        self.map
            .lock()
            .unwrap()
            .get(store)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn mark_changed(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    fn changed(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }
}

#[derive(Serialize, Deserialize, Default)]
struct ShortcutFile {
    shortcuts: ShortcutMap,
}

/// JSON-file-backed store. Loaded eagerly; the host calls `flush` when the
/// invocation ends and `changed` reports true.
pub struct JsonFileShortcuts {
    path: std::path::PathBuf,
    inner: MemoryShortcuts,
}

impl JsonFileShortcuts {
    pub fn load(path: impl Into<std::path::PathBuf>) -> Result<Self, std::io::Error> {
        let path = path.into();
        let map: ShortcutMap = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let file: ShortcutFile = serde_json::from_str(&content)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                file.shortcuts
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ShortcutMap::default(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            inner: MemoryShortcuts {
                map: Mutex::new(map),
                changed: AtomicBool::new(false),
            },
        })
    }

    pub fn flush(&self) -> Result<(), std::io::Error> {
        if !self.inner.changed() {
            return Ok(());
        }
        let file = ShortcutFile {
            shortcuts: self.inner.map.lock().unwrap().clone(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, content)?;
        self.inner.changed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl ShortcutStore for JsonFileShortcuts {
    fn get(&self, store: &str, name: &str) -> Option<Vec<String>> {
        self.inner.get(store, name)
    }

    fn set(&self, store: &str, name: &str, tokens: Vec<String>) {
        self.inner.set(store, name, tokens)
    }

    fn delete(&self, store: &str, name: &str) -> bool {
        self.inner.delete(store, name)
    }

    fn names(&self, store: &str) -> Vec<String> {
        self.inner.names(store)
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

    #[test]
    fn test_memory_set_get_delete() {
        let store = MemoryShortcuts::new();
        assert_eq!(store.get("cli", "money"), None);
        store.set("cli", "money", vec!["usd".to_string(), "1".to_string()]);
        assert_eq!(store.get("cli", "money"), Some(vec!["usd".to_string(), "1".to_string()]));
        assert!(store.changed());
        assert!(store.delete("cli", "money"));
        assert!(!store.delete("cli", "money"));
        assert_eq!(store.names("cli"), Vec::<String>::new());
    }

    #[test]
    fn test_names_keep_insertion_order() {
        let store = MemoryShortcuts::new();
        store.set("cli", "zeta", vec![]);
        store.set("cli", "alpha", vec![]);
        assert_eq!(store.names("cli"), vec!["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn test_with_entries_starts_clean() {
        let store = MemoryShortcuts::with_entries("cli", &[("m", &["usd", "1"])]);
        assert!(!store.changed());
        assert_eq!(store.get("cli", "m"), Some(vec!["usd".to_string(), "1".to_string()]));
    }
}
