//! Scoped, expiring entries over a string key/value backend
//!
//! Every read re-evaluates validity against the clock and location; nothing
//! is cached. Expired entries are only deleted by `cleanup_expired`, which
//! hosts run on page unload (see `platform::web::install_page_store`).

use std::cell::Cell;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::entry::{self, Entry, ExpireAt, Timestamp};
use crate::error::Result;
use crate::platform::{Backend, Clock, Location};

const MS_PER_SECOND: f64 = 1000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Outcome of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Keys present before the pass
    pub before: Vec<String>,
    /// Expired keys the backend actually deleted
    pub removed: Vec<String>,
    /// Keys present after the pass
    pub after: Vec<String>,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Entry store layered on a backend, a clock and a location
pub struct EntryStore<B, C, L> {
    backend: B,
    clock: C,
    location: L,
    debug: Cell<bool>,
    unloaded: Cell<bool>,
}

impl<B: Backend, C: Clock, L: Location> EntryStore<B, C, L> {
    pub fn new(backend: B, clock: C, location: L) -> Self {
        Self::with_config(backend, clock, location, &StoreConfig::default())
    }

    pub fn with_config(backend: B, clock: C, location: L, config: &StoreConfig) -> Self {
        Self {
            backend,
            clock,
            location,
            debug: Cell::new(config.debug_logging),
            unloaded: Cell::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    /// Toggle diagnostics; never changes stored data or results
    pub fn set_debug_logging(&self, enabled: bool) {
        self.debug.set(enabled);
    }

    pub fn debug_logging(&self) -> bool {
        self.debug.get()
    }

    /// Write `value` under `key`, replacing whatever was there
    ///
    /// No validity check happens here: an already expired or out-of-context
    /// entry is stored as given.
    pub fn store_entry<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        context: Option<&str>,
        expire_at: impl Into<ExpireAt>,
    ) -> Result<()> {
        let encoded = entry::encode(value, context, expire_at.into())?;
        self.backend.set(key, &encoded)
    }

    /// Value at `key` if present and currently valid
    ///
    /// A JSON null value reads as `None`. Expired entries stay in storage.
    pub fn read_entry(&self, key: &str) -> Option<Value> {
        let entry = self.load(key)?;
        if !entry.is_valid(&self.location.current_path(), self.clock.now()) {
            return None;
        }
        match entry.into_value() {
            Value::Null => None,
            value => Some(value),
        }
    }

    /// Typed read; values that do not deserialize into `T` read as `None`
    pub fn read_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.read_entry(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                if self.debug.get() {
                    log::warn!("Entry '{}' has unexpected shape: {}", key, e);
                }
                None
            }
        }
    }

    /// Delete `key`; `true` if something was there and is now gone
    ///
    /// A removal the backend refuses is logged and reported as `false`.
    pub fn remove_entry(&self, key: &str) -> bool {
        if self.backend.get(key).is_none() {
            return false;
        }
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not remove '{}': {}", key, e);
                false
            }
        }
    }

    /// Now, advanced by the given offsets
    ///
    /// Each offset is optional: `None`, zero or non-finite offsets contribute
    /// nothing. Negative offsets move into the past, which is the usual way
    /// to build an already expired `expire_at`.
    pub fn future_instant(
        &self,
        seconds: impl Into<Option<f64>>,
        minutes: impl Into<Option<f64>>,
        hours: impl Into<Option<f64>>,
    ) -> Timestamp {
        let total_secs = offset_or_zero(seconds.into())
            + offset_or_zero(minutes.into()) * SECONDS_PER_MINUTE
            + offset_or_zero(hours.into()) * SECONDS_PER_HOUR;
        let delta_ms = (total_secs * MS_PER_SECOND).round() as i64;
        self.clock.now().offset_millis(delta_ms)
    }

    /// All currently valid `(key, value)` pairs
    ///
    /// Order follows the backend's key enumeration, which is
    /// implementation-defined (lexicographic for `MemoryBackend`, storage
    /// index order for browser LocalStorage).
    pub fn list_entries(&self) -> Vec<(String, Value)> {
        let path = self.location.current_path();
        let now = self.clock.now();
        self.backend
            .keys()
            .into_iter()
            .filter_map(|key| {
                let entry = self.load(&key)?;
                entry
                    .is_valid(&path, now)
                    .then(|| (key, entry.into_value()))
            })
            .collect()
    }

    pub fn list_keys(&self) -> Vec<String> {
        self.list_entries().into_iter().map(|(k, _)| k).collect()
    }

    pub fn list_values(&self) -> Vec<Value> {
        self.list_entries().into_iter().map(|(_, v)| v).collect()
    }

    /// Every key in the backend, valid or not
    pub fn raw_keys(&self) -> Vec<String> {
        self.backend.keys()
    }

    /// Delete every expired entry
    ///
    /// Only expiry is considered; entries that are merely out of context are
    /// kept.
    pub fn cleanup_expired(&self) -> CleanupReport {
        let now = self.clock.now();
        let before = self.backend.keys();
        if self.debug.get() {
            log::info!("Cleanup start: {} keys {:?}", before.len(), before);
        }

        let mut removed = Vec::new();
        for key in &before {
            let expired = self
                .load(key)
                .map(|entry| entry.is_expired(now))
                .unwrap_or(false);
            if !expired {
                continue;
            }
            match self.backend.remove(key) {
                Ok(()) => removed.push(key.clone()),
                Err(e) => log::warn!("Could not remove expired '{}': {}", key, e),
            }
        }

        let after = self.backend.keys();
        if self.debug.get() {
            log::info!(
                "Cleanup done: removed {:?}, {} keys {:?}",
                removed,
                after.len(),
                after
            );
        }

        CleanupReport {
            before,
            removed,
            after,
        }
    }

    /// Page-unload hook; runs the cleanup pass at most once per store
    pub fn on_unload(&self) -> Option<CleanupReport> {
        if self.unloaded.replace(true) {
            return None;
        }
        let report = self.cleanup_expired();
        log::info!("Removed {} expired entries on unload", report.removed_count());
        Some(report)
    }

    fn load(&self, key: &str) -> Option<Entry> {
        let raw = self.backend.get(key)?;
        match Entry::parse(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                if self.debug.get() {
                    log::warn!("Entry '{}' is not decodable, treating as plain: {}", key, e.reason);
                }
                Some(e.fallback)
            }
        }
    }
}

fn offset_or_zero(offset: Option<f64>) -> f64 {
    offset.filter(|x| x.is_finite()).unwrap_or(0.0)
}
