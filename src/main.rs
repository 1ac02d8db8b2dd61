//! Scoped Store demo
//!
//! Walks through scoping, expiry and cleanup against an in-memory backend.
//! Run with `SCOPED_STORE_DEBUG=1` to see decode and cleanup diagnostics.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use scoped_store::platform::{self, Location, MemoryBackend, StaticLocation, SystemClock};
    use scoped_store::{EntryStore, ExpireAt, StoreConfig};

    platform::init_logging(log::Level::Info);
    log::info!("Scoped Store (native) demo starting...");

    let config = StoreConfig::from_env();
    let location = Rc::new(StaticLocation::new("/home"));
    let store = EntryStore::with_config(MemoryBackend::new(), SystemClock, location.clone(), &config);

    let past = store.future_instant(-1.0, None, None);
    let writes = [
        store.store_entry("k1", "v1", None, ExpireAt::NEVER),
        store.store_entry("k2", "v2", Some("/admin"), ExpireAt::NEVER),
        store.store_entry("k3", "v3", None, past),
    ];
    if let Some(Err(e)) = writes.into_iter().find(Result::is_err) {
        log::error!("Write failed: {}", e);
        return;
    }

    println!("at {}:", location.current_path());
    println!("  k1 = {:?}", store.read_entry("k1"));
    println!("  k2 = {:?}", store.read_entry("k2"));
    println!("  k3 = {:?}", store.read_entry("k3"));
    println!("  visible keys: {:?}", store.list_keys());
    println!("  raw keys:     {:?}", store.raw_keys());

    location.navigate("/admin/users");
    println!("at {}:", location.current_path());
    println!("  visible keys: {:?}", store.list_keys());

    let report = store.cleanup_expired();
    println!("cleanup removed {:?}", report.removed);
    println!("  raw keys:     {:?}", store.raw_keys());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
