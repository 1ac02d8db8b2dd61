//! Property-based tests for the entry store.
//!
//! Invariants covered:
//! - Unscoped writes read back unchanged
//! - An entry is visible exactly when its context is a segment prefix of the path
//! - Cleanup deletes exactly the expired entries, regardless of context

use proptest::prelude::*;
use serde_json::Value;

use crate::entry::{ExpireAt, Timestamp};
use crate::platform::{Backend, ManualClock, MemoryBackend, StaticLocation};
use crate::store::EntryStore;
use crate::validity::context_matches;

const NOW: i64 = 1_700_000_000_000;

type TestStore = EntryStore<MemoryBackend, ManualClock, StaticLocation>;

fn store_at(path: &str) -> TestStore {
    EntryStore::new(
        MemoryBackend::new(),
        ManualClock::new(Timestamp::from_millis(NOW)),
        StaticLocation::new(path),
    )
}

fn valid_key() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_:-]{0,40}"
}

fn segment() -> impl Strategy<Value = String> {
    "[a-cA-C]{1,3}"
}

/// Non-null JSON values (null reads back as `None` by contract)
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,30}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,5}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn join(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

proptest! {
    #[test]
    fn unscoped_round_trip(key in valid_key(), value in json_value()) {
        let store = store_at("/");
        store.store_entry(&key, &value, None, ExpireAt::NEVER).unwrap();
        prop_assert_eq!(store.read_entry(&key), Some(value));
    }

    #[test]
    fn prefix_context_is_visible(
        path in prop::collection::vec(segment(), 0..6),
        cut in 0usize..6,
    ) {
        let cut = cut.min(path.len());
        let context = join(&path[..cut]);
        let store = store_at(&join(&path));
        store.store_entry("k", "v", Some(context.as_str()), ExpireAt::NEVER).unwrap();
        prop_assert_eq!(store.read_entry("k"), Some(Value::from("v")));
    }

    #[test]
    fn visibility_matches_context_check(
        context in prop::collection::vec(segment(), 0..4),
        path in prop::collection::vec(segment(), 0..4),
    ) {
        let context = join(&context);
        let path = join(&path);
        let store = store_at(&path);
        store.store_entry("k", &1, Some(context.as_str()), ExpireAt::NEVER).unwrap();

        let visible = context_matches(Some(context.as_str()), &path);
        prop_assert_eq!(store.read_entry("k").is_some(), visible);
        prop_assert_eq!(store.list_keys().len(), usize::from(visible));
    }

    #[test]
    fn cleanup_removes_exactly_expired(
        offsets in prop::collection::vec((-5_000i64..5_000, any::<bool>()), 1..20),
    ) {
        let store = store_at("/home");
        for (i, (offset, scoped)) in offsets.iter().enumerate() {
            let context = scoped.then_some("/admin");
            let expiry = Timestamp::from_millis(NOW + offset);
            store.store_entry(&format!("k{:02}", i), &i, context, expiry).unwrap();
        }

        let report = store.cleanup_expired();

        for (i, (offset, _)) in offsets.iter().enumerate() {
            let key = format!("k{:02}", i);
            let expired = *offset < 0;
            prop_assert_eq!(report.removed.contains(&key), expired);
            prop_assert_eq!(store.backend().get(&key).is_some(), !expired);
        }
    }
}
