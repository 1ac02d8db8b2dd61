//! End-to-end walk through scoping, expiry and cleanup via the public API.

use std::rc::Rc;

use scoped_store::platform::{Backend, ManualClock, MemoryBackend, StaticLocation};
use scoped_store::{EntryStore, ExpireAt, StoreConfig, Timestamp};
use serde_json::json;

#[test]
fn scoped_expiring_entries_lifecycle() {
    let backend = Rc::new(MemoryBackend::new());
    let location = Rc::new(StaticLocation::new("/home"));
    let store = EntryStore::with_config(
        backend.clone(),
        ManualClock::new(Timestamp::from_millis(1_000_000)),
        location.clone(),
        &StoreConfig::default().with_debug_logging(true),
    );

    store.store_entry("k1", "v1", None, ExpireAt::NEVER).unwrap();
    assert_eq!(store.read_entry("k1"), Some(json!("v1")));

    store
        .store_entry("k2", "v2", Some("/admin"), ExpireAt::NEVER)
        .unwrap();
    assert_eq!(store.read_entry("k2"), None);

    let past = store.future_instant(-1.0, None, None);
    store.store_entry("k3", "v3", None, past).unwrap();
    assert_eq!(store.read_entry("k3"), None);
    assert_eq!(store.list_keys(), vec!["k1".to_string()]);
    assert!(backend.keys().contains(&"k3".to_string()));

    let report = store.on_unload().expect("first unload runs cleanup");
    assert_eq!(report.removed, vec!["k3".to_string()]);
    assert_eq!(backend.keys(), vec!["k1".to_string(), "k2".to_string()]);

    location.navigate("/admin");
    assert_eq!(store.read_entry("k2"), Some(json!("v2")));
    assert_eq!(
        store.list_entries(),
        vec![
            ("k1".to_string(), json!("v1")),
            ("k2".to_string(), json!("v2")),
        ]
    );

    assert!(store.remove_entry("k1"));
    assert!(!store.remove_entry("k1"));
    assert_eq!(store.list_values(), vec![json!("v2")]);
}

#[test]
fn foreign_values_in_shared_storage_stay_readable() {
    let backend = Rc::new(MemoryBackend::new());
    backend.set("theme", "dark").unwrap();
    backend.set("counter", "42").unwrap();

    let store = EntryStore::new(
        backend.clone(),
        ManualClock::new(Timestamp::from_millis(0)),
        StaticLocation::default(),
    );
    assert_eq!(store.read_entry("theme"), Some(json!("dark")));
    assert_eq!(store.read_as::<u32>("counter"), Some(42));
    assert!(store.cleanup_expired().removed.is_empty());
    assert_eq!(backend.len(), 2);
}
