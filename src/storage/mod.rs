//! Persistent key-value cache for preferences and last-known responses.
//!
//! - `KeyValueStore` stores opaque text (SQLite, memory, or nothing at all)
//! - `LocalCache` adds typed `get`/`set`/`remove` with default fallback

mod local;
mod store;

pub use local::LocalCache;
pub use store::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};
