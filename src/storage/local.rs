//! Typed access to a key-value store with graceful fallback.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, warn};

use super::store::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};
use crate::env::Environment;

/// Typed cache over a [`KeyValueStore`].
///
/// Reads never fail: a missing, unreadable or undecodable entry yields the
/// caller's default. Writes never fail either; storage errors are logged.
///
/// Strings that are not themselves valid JSON are stored verbatim so plain
/// preference strings stay readable in storage. Everything else, including
/// strings such as `"42"` or `"null"`, is stored as JSON text.
#[derive(Clone)]
pub struct LocalCache {
  store: Arc<dyn KeyValueStore>,
}

impl LocalCache {
  pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
    Self {
      store: Arc::new(store),
    }
  }

  /// Open the cache appropriate for `env`.
  ///
  /// Without a storage medium every operation is a no-op. If the SQLite
  /// store cannot be opened the cache degrades to process memory.
  pub fn open(env: &Environment, path: Option<&Path>) -> Self {
    if !env.storage {
      return Self::new(NoopStore);
    }

    let opened = match path {
      Some(p) => SqliteStore::open_at(p),
      None => SqliteStore::open(),
    };

    match opened {
      Ok(store) => Self::new(store),
      Err(e) => {
        error!(error = %e, "failed to open local store, falling back to memory");
        Self::new(MemoryStore::new())
      }
    }
  }

  /// Read `key`, returning `default` if it is absent or corrupt.
  pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
    let raw = match self.store.get_raw(key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return default,
      Err(e) => {
        error!(key, error = %e, "failed to read local store");
        return default;
      }
    };

    match decode(&raw) {
      Ok(value) => value,
      Err(e) => {
        warn!(key, error = %e, "stored value is corrupt, using default");
        default
      }
    }
  }

  /// Write `value` under `key`.
  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
    let text = match encode(value) {
      Ok(text) => text,
      Err(e) => {
        error!(key, error = %e, "failed to encode value for local store");
        return;
      }
    };

    if let Err(e) = self.store.set_raw(key, &text) {
      error!(key, error = %e, "failed to write local store");
    }
  }

  pub fn remove(&self, key: &str) {
    if let Err(e) = self.store.remove(key) {
      error!(key, error = %e, "failed to remove from local store");
    }
  }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
  match serde_json::to_value(value)? {
    Value::String(s) if serde_json::from_str::<Value>(&s).is_err() => Ok(s),
    other => serde_json::to_string(&other),
  }
}

/// Valid JSON is always JSON-encoded; anything else was a verbatim string.
fn decode<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
  match serde_json::from_str::<Value>(raw) {
    Ok(parsed) => serde_json::from_value(parsed),
    Err(_) => serde_json::from_value(Value::String(raw.to_owned())),
  }
}
