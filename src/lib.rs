//! Scoped Store - expiring, path-scoped entries over browser LocalStorage
//!
//! Core modules:
//! - `entry`: Stored JSON form and decoding (scoped vs plain entries)
//! - `validity`: Context (path prefix) and expiry checks
//! - `store`: `EntryStore` read/write/list/cleanup operations
//! - `platform`: Backend, clock and location collaborators (browser + in-memory)
//! - `config`: Store configuration
//!
//! ```
//! use scoped_store::{EntryStore, ExpireAt, Timestamp};
//! use scoped_store::platform::{ManualClock, MemoryBackend, StaticLocation};
//!
//! let store = EntryStore::new(
//!     MemoryBackend::new(),
//!     ManualClock::new(Timestamp::from_millis(0)),
//!     StaticLocation::new("/home"),
//! );
//! store.store_entry("greeting", "hi", None, ExpireAt::NEVER).unwrap();
//! store.store_entry("admin_only", "x", Some("/admin"), ExpireAt::NEVER).unwrap();
//!
//! assert_eq!(store.read_entry("greeting"), Some(serde_json::json!("hi")));
//! assert_eq!(store.read_entry("admin_only"), None);
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod platform;
pub mod store;
pub mod validity;

#[cfg(test)]
mod property_tests;

pub use config::StoreConfig;
pub use entry::{Entry, ExpireAt, Timestamp};
pub use error::{Result, StoreError};
pub use store::{CleanupReport, EntryStore};
