//! Browser collaborators (wasm32 only)
//!
//! - `LocalStorage`: `window.localStorage`
//! - `JsClock`: `Date.now()`
//! - `WindowLocation`: `window.location.pathname`, read fresh on every check
//!
//! The module start hook only initializes logging. Hosts call
//! `initScopedStore` from JS (or `install_page_store` from Rust) with their
//! config to install the page's single unload cleanup.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::StoreConfig;
use crate::entry::Timestamp;
use crate::error::{Result, StoreError};
use crate::store::EntryStore;

use super::{Backend, Clock, Location, UnloadHook, init_logging};

thread_local! {
    static PAGE_UNLOAD: UnloadHook = const { UnloadHook::new() };
}

/// Store over the page's LocalStorage
pub type WebStore = EntryStore<LocalStorage, JsClock, WindowLocation>;

/// `window.localStorage`
///
/// Keys enumerate in the browser's storage index order, which is not
/// guaranteed to be insertion order or stable across writes.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// `None` when there is no window or storage is disabled
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl Backend for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(StoreError::from)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(StoreError::from)
    }

    fn keys(&self) -> Vec<String> {
        let len = self.storage.length().unwrap_or(0);
        (0..len)
            .filter_map(|i| self.storage.key(i).ok().flatten())
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsClock;

impl Clock for JsClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(js_sys::Date::now() as i64)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowLocation;

impl Location for WindowLocation {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }
}

impl WebStore {
    /// Store over `window.localStorage`, `None` if storage is unavailable
    pub fn local(config: &StoreConfig) -> Option<Self> {
        let storage = LocalStorage::open()?;
        Some(EntryStore::with_config(storage, JsClock, WindowLocation, config))
    }
}

/// Run `store.on_unload()` when the page is hidden for unload
///
/// Uses `pagehide`, which also fires for back/forward cache navigations where
/// `unload` does not.
fn add_pagehide_listener<B, C, L>(store: Rc<EntryStore<B, C, L>>) -> Result<()>
where
    B: Backend + 'static,
    C: Clock + 'static,
    L: Location + 'static,
{
    let window =
        web_sys::window().ok_or_else(|| StoreError::Backend("no window".to_string()))?;
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        store.on_unload();
    });
    window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Build the page's store from `config` and clean it up on unload
///
/// Only the first successful call per page installs a listener; later calls
/// return `None`, so the cleanup pass runs once per page lifetime. The
/// returned store is the one the listener uses, so its debug flag can be
/// toggled later.
pub fn install_page_store(config: &StoreConfig) -> Option<Rc<WebStore>> {
    PAGE_UNLOAD.with(|hook| hook.install(config, WebStore::local, add_pagehide_listener))
}

#[wasm_bindgen(start)]
pub fn start() {
    init_logging(log::Level::Info);
}

/// JS entry: install the unload cleanup with a JSON `StoreConfig`
///
/// Missing or malformed config falls back to defaults. Returns whether a
/// cleanup listener was installed by this call.
#[wasm_bindgen(js_name = initScopedStore)]
pub fn init_scoped_store(config_json: Option<String>) -> bool {
    let config = config_json
        .as_deref()
        .map(StoreConfig::from_json)
        .unwrap_or_default();
    install_page_store(&config).is_some()
}
