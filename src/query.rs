//! Async query and mutation handles with loading/error/data state.
//!
//! A `Query<T>` owns a fetcher closure and runs it on the tokio runtime,
//! reporting back through a channel. The owner drives it from its own loop:
//!
//! ```ignore
//! let mut profile = hooks::profile_query(&client, &env);
//!
//! // Either drive it from a loop...
//! while !profile.poll() {
//!     tick().await;
//! }
//! // ...or wait for the pending fetch directly
//! if let QueryState::Error(message) = profile.settle().await {
//!     eprintln!("{message}");
//! }
//! ```
//!
//! State machine:
//!
//! ```text
//! idle    -> loading (on mount or refetch)
//! loading -> success | error
//! success -> loading (on refetch)
//! error   -> loading (on refetch)
//! ```
//!
//! There is no terminal state; `unmount` (or dropping the handle) stops
//! all further state changes.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::env::Environment;

/// Delay between mounting and the first fetch.
pub const MOUNT_DELAY: Duration = Duration::from_millis(100);

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Async result handling via channels
/// - A shared "still interested" flag checked before any result is delivered
///
/// A newer `refetch` supersedes an in-flight one: the older result is
/// dropped with its receiver.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  mounted: Arc<AtomicBool>,
  network: bool,
  mount_delay: Duration,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()` or `refetch()` is invoked. Nothing runs until
  /// `mount`, `fetch` or `refetch` is called.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      mounted: Arc::new(AtomicBool::new(true)),
      network: true,
      mount_delay: MOUNT_DELAY,
    }
  }

  /// Set the delay before the fetch started by `mount`.
  pub fn with_mount_delay(mut self, delay: Duration) -> Self {
    self.mount_delay = delay;
    self
  }

  /// Attach the query to `env` and start the initial fetch.
  ///
  /// Without network capability the query stays idle (not loading, no
  /// data) and every later fetch is skipped.
  pub fn mount(mut self, env: &Environment) -> Self {
    self.network = env.network;
    if self.network {
      self.start_fetch(self.mount_delay);
    }
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is currently loading.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query succeeded.
  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error message if the query failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  pub fn is_mounted(&self) -> bool {
    self.mounted.load(Ordering::SeqCst)
  }

  /// Start fetching data if not already loading.
  ///
  /// This is a no-op if the query is already loading or unmounted.
  pub fn fetch(&mut self) {
    if self.state.is_loading() || !self.can_fetch() {
      return;
    }
    self.start_fetch(Duration::ZERO);
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    if !self.can_fetch() {
      return;
    }
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch(Duration::ZERO);
  }

  /// Stop accepting results. In-flight fetches are discarded.
  pub fn unmount(&mut self) {
    self.mounted.store(false, Ordering::SeqCst);
    self.receiver = None;
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    // Try to receive without blocking
    match receiver.try_recv() {
      Ok(result) => {
        self.apply(result);
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.apply_cancelled();
        true
      }
    }
  }

  /// Wait for the pending fetch, if any, and return the resulting state.
  pub async fn settle(&mut self) -> &QueryState<T> {
    let received = match &mut self.receiver {
      Some(receiver) => receiver.recv().await,
      None => return &self.state,
    };

    match received {
      Some(result) => self.apply(result),
      None => self.apply_cancelled(),
    }
    &self.state
  }

  fn can_fetch(&self) -> bool {
    self.network && self.is_mounted()
  }

  fn apply(&mut self, result: Result<T, String>) {
    self.receiver = None;
    self.state = match result {
      Ok(data) => QueryState::Success(data),
      Err(error) => QueryState::Error(error),
    };
  }

  fn apply_cancelled(&mut self) {
    // Sender dropped without sending - treat as error
    self.receiver = None;
    self.state = QueryState::Error("Query was cancelled".to_string());
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self, delay: Duration) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    let mounted = Arc::clone(&self.mounted);
    tokio::spawn(async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      if !mounted.load(Ordering::SeqCst) {
        return;
      }

      let result = future.await;
      if mounted.load(Ordering::SeqCst) {
        // Ignore send errors - a newer fetch may have replaced the receiver
        let _ = tx.send(result);
      }
    });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.mounted.store(false, Ordering::SeqCst);
  }
}

// Query is not Clone because the fetcher is boxed and receiver is owned.
// If you need to share a query, wrap it in Arc<Mutex<Query<T>>>.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("mounted", &self.mounted.load(Ordering::SeqCst))
      .field("network", &self.network)
      .finish_non_exhaustive()
  }
}

/// A factory function that sends a request body and yields the response
type SenderFn<B, T> = Box<dyn Fn(B) -> BoxFuture<T> + Send + Sync>;

/// Handle for create/update style calls.
///
/// Unlike `Query`, no data is retained between calls: each `mutate` returns
/// its own outcome. `loading` and `error` reflect the latest call.
pub struct Mutation<B, T> {
  sender: SenderFn<B, T>,
  loading: bool,
  error: Option<String>,
  network: bool,
}

impl<B: Send + 'static, T: Send + 'static> Mutation<B, T> {
  pub fn new<F, Fut>(sender: F) -> Self
  where
    F: Fn(B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      sender: Box::new(move |body| Box::pin(sender(body))),
      loading: false,
      error: None,
      network: true,
    }
  }

  pub fn mount(mut self, env: &Environment) -> Self {
    self.network = env.network;
    self
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Send `body`. Returns `None` on failure (see `error`) or when the
  /// environment has no network.
  pub async fn mutate(&mut self, body: B) -> Option<T> {
    if !self.network {
      return None;
    }

    self.loading = true;
    self.error = None;

    let result = (self.sender)(body).await;
    self.loading = false;

    match result {
      Ok(data) => Some(data),
      Err(e) => {
        self.error = Some(e);
        None
      }
    }
  }
}

impl<B, T> std::fmt::Debug for Mutation<B, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("loading", &self.loading)
      .field("error", &self.error)
      .finish_non_exhaustive()
  }
}
