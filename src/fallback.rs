//! Last-known-good responses for when a query fails.
//!
//! A successful query result is remembered in the [`LocalCache`] under a
//! `last:*` key. When a later query fails, the remembered value is served
//! alongside the error instead of nothing.

use serde::Serialize;
use serde_json::Value;

use crate::api::Stage;
use crate::query::QueryState;
use crate::storage::LocalCache;

/// What to show for a settled query.
#[derive(Debug, PartialEq)]
pub enum Outcome<'a, T> {
  /// The query has not finished
  Pending,
  /// Fresh data; it has been remembered
  Fresh(&'a T),
  /// The query failed but an earlier response exists
  Stale { data: Value, error: &'a str },
}

/// Resolve `state`, remembering fresh data under `key` and falling back to
/// the remembered value on error.
///
/// Fails with the query's error message when there is nothing to fall back to.
pub fn resolve<'a, T: Serialize>(
  state: &'a QueryState<T>,
  cache: &LocalCache,
  key: &str,
) -> Result<Outcome<'a, T>, String> {
  match state {
    QueryState::Success(data) => {
      cache.set(key, data);
      Ok(Outcome::Fresh(data))
    }
    QueryState::Error(error) => match cache.get::<Option<Value>>(key, None) {
      Some(data) => Ok(Outcome::Stale {
        data,
        error: error.as_str(),
      }),
      None => Err(error.clone()),
    },
    QueryState::Idle | QueryState::Loading => Ok(Outcome::Pending),
  }
}

pub fn profile_key() -> String {
  "last:profile".to_string()
}

pub fn projects_key(featured: bool) -> String {
  if featured {
    "last:projects:featured".to_string()
  } else {
    "last:projects".to_string()
  }
}

pub fn biography_key(stage: Stage) -> String {
  format!("last:biography:{stage}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStore;
  use serde_json::json;

  fn cache() -> LocalCache {
    LocalCache::new(MemoryStore::new())
  }

  #[test]
  fn test_success_is_remembered() {
    let cache = cache();
    let state = QueryState::Success(vec!["a".to_string(), "b".to_string()]);

    let outcome = resolve(&state, &cache, &projects_key(false)).unwrap();
    assert_eq!(outcome, Outcome::Fresh(&vec!["a".to_string(), "b".to_string()]));
    assert_eq!(
      cache.get::<Option<Value>>("last:projects", None),
      Some(json!(["a", "b"]))
    );
  }

  #[test]
  fn test_error_serves_remembered_value() {
    let cache = cache();
    let key = biography_key(Stage::Youth);
    resolve(&QueryState::Success(json!({"title": "School"})), &cache, &key).unwrap();

    let failed: QueryState<Value> = QueryState::Error("HTTP 502: Bad Gateway".to_string());
    assert_eq!(
      resolve(&failed, &cache, &key).unwrap(),
      Outcome::Stale {
        data: json!({"title": "School"}),
        error: "HTTP 502: Bad Gateway",
      }
    );
  }

  #[test]
  fn test_error_without_remembered_value_fails() {
    let cache = cache();
    let failed: QueryState<Value> = QueryState::Error("Response is not JSON".to_string());

    let err = resolve(&failed, &cache, &profile_key()).unwrap_err();
    assert_eq!(err, "Response is not JSON");
    // Nothing is written on failure
    assert_eq!(cache.get::<Option<Value>>(&profile_key(), None), None);
  }

  #[test]
  fn test_unsettled_query_is_pending() {
    let cache = cache();
    let loading: QueryState<u32> = QueryState::Loading;
    assert_eq!(resolve(&loading, &cache, "last:any").unwrap(), Outcome::Pending);
  }

  #[test]
  fn test_keys_are_distinct_per_resource() {
    assert_eq!(projects_key(true), "last:projects:featured");
    assert_eq!(biography_key(Stage::Present), "last:biography:present");
    assert_ne!(projects_key(true), projects_key(false));
  }
}
