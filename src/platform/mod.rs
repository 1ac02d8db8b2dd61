//! Platform abstraction layer
//!
//! The store talks to its environment through three collaborators:
//! - `Backend`: string key/value storage (LocalStorage on web)
//! - `Clock`: current instant
//! - `Location`: current page path
//!
//! `memory` provides in-process implementations for native hosts and tests,
//! `web` the browser ones.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::entry::Timestamp;
use crate::error::Result;

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::{ManualClock, MemoryBackend, StaticLocation};
#[cfg(not(target_arch = "wasm32"))]
pub use memory::SystemClock;

/// Synchronous string-keyed, string-valued storage
pub trait Backend {
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, overwriting any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is a no-op, not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Every key currently stored, in the backend's native order
    fn keys(&self) -> Vec<String>;
}

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Source of the current "/"-delimited path
pub trait Location {
    fn current_path(&self) -> String;
}

impl<T: Backend + ?Sized> Backend for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<T: Location + ?Sized> Location for Rc<T> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }
}

/// Page-wide unload cleanup installation
///
/// A page gets at most one cleanup store. Later installs are refused so the
/// cleanup pass runs once per page lifetime, whoever asks for it.
#[derive(Debug, Default)]
pub struct UnloadHook {
    installed: Cell<bool>,
}

impl UnloadHook {
    pub const fn new() -> Self {
        Self {
            installed: Cell::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    /// Open a store for `config` and hand it to `register`
    ///
    /// Returns the registered store, or `None` when cleanup is disabled by
    /// config, already installed, storage is unavailable or registration
    /// fails. Only a successful registration marks the hook installed.
    pub fn install<S>(
        &self,
        config: &StoreConfig,
        open: impl FnOnce(&StoreConfig) -> Option<S>,
        register: impl FnOnce(Rc<S>) -> Result<()>,
    ) -> Option<Rc<S>> {
        if !config.cleanup_on_unload {
            log::info!("Unload cleanup disabled by config");
            return None;
        }
        if self.installed.get() {
            log::warn!("Unload cleanup already installed for this page");
            return None;
        }
        let Some(store) = open(config) else {
            log::warn!("Storage unavailable, expired entries will not be cleaned up");
            return None;
        };
        let store = Rc::new(store);
        if let Err(e) = register(store.clone()) {
            log::warn!("Could not register unload cleanup: {}", e);
            return None;
        }
        self.installed.set(true);
        Some(store)
    }
}

/// Initialize logging for the current platform
///
/// Browser builds log to the devtools console and install the panic hook;
/// native builds use `env_logger` (`RUST_LOG` overrides `level`).
/// Calling this more than once is harmless.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(level);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: log::Level) {
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    let _ = env_logger::Builder::from_env(env).try_init();
}
