//! HTTP client with a per-attempt timeout and exponential backoff.
//!
//! - Every attempt is bounded by `RetryPolicy::timeout` (10s by default).
//! - Connection-level failures are retried up to `max_attempts` attempts in
//!   total, sleeping `2^attempt * backoff_base` after failed attempt `attempt`
//!   (200ms, 400ms, ...).
//! - Timeouts and 404 responses end the loop immediately.
//! - Any other status is handed back to the caller unretried.
//!
//! There is no jitter, circuit breaker or rate limiting.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;

/// Per-attempt timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Total attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const BACKOFF_BASE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub timeout: Duration,
  pub backoff_base: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: DEFAULT_MAX_ATTEMPTS,
      timeout: REQUEST_TIMEOUT,
      backoff_base: BACKOFF_BASE,
    }
  }
}

impl RetryPolicy {
  /// Delay after failed attempt `attempt` (counted from 1).
  pub fn backoff(&self, attempt: u32) -> Duration {
    self.backoff_base * 2u32.saturating_pow(attempt)
  }
}

/// Run `attempt_fn` until it succeeds, returns a non-retryable error, or
/// the policy's attempts are used up. The last error is returned.
pub async fn with_retries<T, F, Fut>(
  policy: &RetryPolicy,
  url: &str,
  mut attempt_fn: F,
) -> Result<T, ApiError>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, ApiError>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;

  loop {
    match attempt_fn(attempt).await {
      Ok(value) => return Ok(value),
      Err(err) => {
        warn!(url, attempt, max_attempts, error = %err, "fetch attempt failed");

        if !err.is_retryable() || attempt >= max_attempts {
          return Err(err);
        }

        tokio::time::sleep(policy.backoff(attempt)).await;
        attempt += 1;
      }
    }
  }
}

/// reqwest client wrapped in the retry policy.
#[derive(Clone)]
pub struct ResilientClient {
  http: Client,
  policy: RetryPolicy,
}

impl ResilientClient {
  pub fn new(policy: RetryPolicy) -> Self {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let http = Client::builder()
      .default_headers(headers)
      .build()
      .unwrap_or_else(|e| {
        warn!("Failed to build HTTP client with default headers: {}", e);
        Client::new()
      });

    Self { http, policy }
  }

  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  /// Send a request, retrying transient failures.
  pub async fn send(
    &self,
    method: Method,
    url: &Url,
    body: Option<&Value>,
  ) -> Result<Response, ApiError> {
    with_retries(&self.policy, url.as_str(), |attempt| {
      let mut request = self
        .http
        .request(method.clone(), url.clone())
        .timeout(self.policy.timeout);
      if let Some(body) = body {
        request = request.json(body);
      }

      debug!(%method, %url, attempt, "sending request");

      async move {
        let response = request
          .send()
          .await
          .map_err(|e| self.classify(url, e))?;

        if response.status() == StatusCode::NOT_FOUND {
          return Err(http_error(response.status()));
        }

        Ok(response)
      }
    })
    .await
  }

  fn classify(&self, url: &Url, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
      ApiError::Timeout {
        url: url.to_string(),
        after: self.policy.timeout,
      }
    } else {
      ApiError::Network {
        url: url.to_string(),
        message: err.to_string(),
      }
    }
  }
}

pub(crate) fn http_error(status: StatusCode) -> ApiError {
  ApiError::Http {
    status: status.as_u16(),
    reason: status.canonical_reason().unwrap_or_default().to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};
  use tokio::time::Instant;

  fn network_error() -> ApiError {
    ApiError::Network {
      url: "http://localhost/api/profile".into(),
      message: "connection reset".into(),
    }
  }

  /// The paused clock may round timers up to the next millisecond.
  fn assert_near(actual: Duration, expected: Duration) {
    assert!(
      actual >= expected && actual <= expected + Duration::from_millis(5),
      "expected ~{:?}, got {:?}",
      expected,
      actual
    );
  }

  #[test]
  fn test_backoff_doubles() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff(1), Duration::from_millis(200));
    assert_eq!(policy.backoff(2), Duration::from_millis(400));
    assert_eq!(policy.backoff(3), Duration::from_millis(800));
  }

  #[tokio::test(start_paused = true)]
  async fn test_network_errors_retried_with_backoff() {
    let policy = RetryPolicy::default();
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();

    let result: Result<(), ApiError> = with_retries(&policy, "test", |attempt| {
      attempts.lock().unwrap().push((attempt, start.elapsed()));
      async { Err(network_error()) }
    })
    .await;

    assert_eq!(result.unwrap_err(), network_error());

    let attempts = attempts.lock().unwrap();
    let numbers: Vec<u32> = attempts.iter().map(|(n, _)| *n).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    // 200ms after the first failure, 400ms after the second, none after the last
    assert_near(attempts[0].1, Duration::ZERO);
    assert_near(attempts[1].1, Duration::from_millis(200));
    assert_near(attempts[2].1, Duration::from_millis(600));
    assert_near(start.elapsed(), Duration::from_millis(600));
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout_not_retried() {
    let policy = RetryPolicy::default();
    let mut calls = 0;

    let result: Result<(), ApiError> = with_retries(&policy, "test", |_| {
      calls += 1;
      async {
        Err(ApiError::Timeout {
          url: "test".into(),
          after: REQUEST_TIMEOUT,
        })
      }
    })
    .await;

    assert!(matches!(result, Err(ApiError::Timeout { .. })));
    assert_eq!(calls, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_not_found_not_retried() {
    let policy = RetryPolicy::default();
    let mut calls = 0;

    let result: Result<(), ApiError> = with_retries(&policy, "test", |_| {
      calls += 1;
      async { Err(http_error(StatusCode::NOT_FOUND)) }
    })
    .await;

    assert_eq!(
      result.unwrap_err(),
      ApiError::Http {
        status: 404,
        reason: "Not Found".into()
      }
    );
    assert_eq!(calls, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_recovers_after_transient_failure() {
    let policy = RetryPolicy::default();

    let result = with_retries(&policy, "test", |attempt| async move {
      if attempt < 2 {
        Err(network_error())
      } else {
        Ok(attempt)
      }
    })
    .await;

    assert_eq!(result.unwrap(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_attempts_still_tries_once() {
    let policy = RetryPolicy {
      max_attempts: 0,
      ..Default::default()
    };
    let mut calls = 0;

    let _: Result<(), ApiError> = with_retries(&policy, "test", |_| {
      calls += 1;
      async { Err(network_error()) }
    })
    .await;

    assert_eq!(calls, 1);
  }
}
