//! In-process collaborators
//!
//! Useful for native hosts, server-side rendering and tests. All of them use
//! interior mutability so they can be shared through `Rc` with a store.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::entry::Timestamp;
use crate::error::{Result, StoreError};

use super::{Backend, Clock, Location};

/// Map-backed storage
///
/// Keys enumerate in lexicographic order. An optional quota (in bytes of
/// key + value, like browser storage) makes oversized writes fail, and a
/// read-only backend rejects every write and removal.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
    read_only: Cell<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Reject writes and removals, like storage disabled by the browser
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.read_only.get() {
            return Err(StoreError::Backend(format!(
                "storage is read-only, cannot modify '{}'",
                key
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Bytes used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::Backend(format!(
                    "quota exceeded writing '{}' ({} > {} bytes)",
                    key, needed, quota
                )));
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.now.set(self.now.get().offset_millis(delta));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Wall clock for native hosts
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now().into()
    }
}

/// Fixed path that can be changed to simulate navigation
#[derive(Debug)]
pub struct StaticLocation {
    path: RefCell<String>,
}

impl StaticLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RefCell::new(path.into()),
        }
    }

    pub fn navigate(&self, path: impl Into<String>) {
        *self.path.borrow_mut() = path.into();
    }
}

impl Default for StaticLocation {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Location for StaticLocation {
    fn current_path(&self) -> String {
        self.path.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_basic_ops() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());
        backend.set("b", "2").unwrap();
        backend.set("a", "1").unwrap();
        assert_eq!(backend.get("a").as_deref(), Some("1"));
        assert_eq!(backend.keys(), vec!["a".to_string(), "b".to_string()]);

        backend.remove("a").unwrap();
        backend.remove("missing").unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("a"), None);
    }

    #[test]
    fn test_memory_backend_quota() {
        let backend = MemoryBackend::with_quota(10);
        backend.set("key", "1234567").unwrap();
        assert!(matches!(
            backend.set("other", "x"),
            Err(StoreError::Backend(_))
        ));
        // Overwriting frees the old value first
        backend.set("key", "abcdefg").unwrap();
        assert_eq!(backend.used_bytes(), 10);
    }

    #[test]
    fn test_memory_backend_read_only() {
        let backend = MemoryBackend::new();
        backend.set("k", "v").unwrap();
        backend.set_read_only(true);
        assert!(matches!(backend.remove("k"), Err(StoreError::Backend(_))));
        assert!(matches!(backend.set("k", "w"), Err(StoreError::Backend(_))));
        assert_eq!(backend.get("k").as_deref(), Some("v"));

        backend.set_read_only(false);
        backend.remove("k").unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp::from_millis(100));
        clock.advance_millis(-150);
        assert_eq!(clock.now(), Timestamp::from_millis(-50));
        clock.set(Timestamp::from_millis(7));
        assert_eq!(clock.now().as_millis(), 7);
    }

    #[test]
    fn test_static_location_navigate() {
        let location = StaticLocation::default();
        assert_eq!(location.current_path(), "/");
        location.navigate("/admin/users");
        assert_eq!(location.current_path(), "/admin/users");
    }
}
