//! Error types for the API and storage layers.
//!
//! Query handles surface these as plain strings on their `error` field;
//! the variants exist so the fetch layer can decide what to retry.

use std::time::Duration;

/// Failure while talking to the portfolio API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
  /// A single attempt exceeded the per-attempt timeout.
  #[error("request to {url} timed out after {}ms", .after.as_millis())]
  Timeout { url: String, after: Duration },

  /// Connection-level failure (refused, reset, DNS).
  #[error("network error for {url}: {message}")]
  Network { url: String, message: String },

  /// Non-2xx response status.
  #[error("HTTP {status}: {reason}")]
  Http { status: u16, reason: String },

  /// Body is not JSON or does not match the response envelope.
  #[error("{0}")]
  MalformedResponse(String),

  /// The envelope carried `success: false`.
  #[error("{0}")]
  Rejected(String),

  /// Biography stage outside the fixed set.
  #[error("Invalid stage: {0}")]
  InvalidStage(String),

  /// Request body failed client-side validation.
  #[error("{0}")]
  Validation(String),
}

impl ApiError {
  /// Whether the fetch client should try again after this error.
  pub fn is_retryable(&self) -> bool {
    matches!(self, ApiError::Network { .. })
  }
}

/// Failure of the persistent storage medium.
///
/// `LocalCache` logs and swallows these; only the raw stores return them.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to create storage directory {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("storage lock poisoned")]
  LockPoisoned,

  #[error("could not determine data directory")]
  NoDataDir,
}
