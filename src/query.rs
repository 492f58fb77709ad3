//! Poll-driven query and mutation handles for a rendering layer.
//!
//! Inspired by TanStack Query, a [`Query<T>`] wraps a read and exposes its
//! loading/success/error state, and a [`Mutation<P, T>`] wraps a write and
//! exposes a trigger plus pending/error state. Both run their work on the
//! tokio runtime and hand results back through a channel, so a UI loop can
//! `poll()` them each tick without blocking.
//!
//! # Example
//!
//! ```ignore
//! let mut members = gym.members_query(Some("loc-1".to_string()));
//! members.fetch();
//!
//! // In event loop tick
//! if members.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! match members.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(list) => render_members(list),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::ApiError;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(ApiError),
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

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// The fetcher runs on a spawned task and its result comes back through a
/// channel, so `poll()` never blocks and `settle()` can await it.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` starts a
  /// request.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      stale_time: Duration::from_secs(60),
    }
  }

  /// Set the stale time for this query.
  ///
  /// After this duration, the data is considered stale and `is_stale()` returns true.
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  /// Current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Data from the last successful fetch.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if a fetch is in progress.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the last fetch succeeded.
  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  /// Check if the last fetch failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Error from the last fetch, kept typed so callers can match on 401.
  pub fn error(&self) -> Option<&ApiError> {
    self.state.error()
  }

  /// Check if the data is stale (older than stale_time).
  pub fn is_stale(&self) -> bool {
    match &self.state {
      QueryState::Success(_) => self
        .fetched_at
        .map(|t| t.elapsed() > self.stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }

  /// Start fetching data. No-op while already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Dropping the receiver discards the pending result
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = QueryState::Error(ApiError::Network("query was cancelled".to_string()));
        self.receiver = None;
        true
      }
    }
  }

  /// Wait for the pending fetch to finish. Returns immediately when idle.
  pub async fn settle(&mut self) -> &QueryState<T> {
    if let Some(rx) = &mut self.receiver {
      let result = rx
        .recv()
        .await
        .unwrap_or_else(|| Err(ApiError::Network("query was cancelled".to_string())));
      self.receiver = None;
      match result {
        Ok(data) => {
          self.state = QueryState::Success(data);
          self.fetched_at = Some(Instant::now());
        }
        Err(error) => self.state = QueryState::Error(error),
      }
    }
    &self.state
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by refetch
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

/// The state of a mutation
#[derive(Debug, Clone)]
pub enum MutationState<T> {
  /// Not triggered yet, or reset
  Idle,
  /// Write in flight
  Pending,
  /// Write accepted by the server
  Success(T),
  /// Write failed with an error
  Error(ApiError),
}

type MutatorFn<P, T> = Box<dyn Fn(P) -> BoxFuture<T> + Send + Sync>;

/// Async write with a trigger and pending/success/error state.
pub struct Mutation<P, T> {
  state: MutationState<T>,
  mutator: MutatorFn<P, T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
}

impl<P: Send + 'static, T: Send + 'static> Mutation<P, T> {
  /// Create a mutation from a function that performs the write for a payload.
  pub fn new<F, Fut>(mutator: F) -> Self
  where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      mutator: Box::new(move |payload| Box::pin(mutator(payload))),
      receiver: None,
    }
  }

  /// Current state of the mutation.
  pub fn state(&self) -> &MutationState<T> {
    &self.state
  }

  /// Check if a write is in flight.
  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  /// Server response from the last successful write.
  pub fn data(&self) -> Option<&T> {
    match &self.state {
      MutationState::Success(data) => Some(data),
      _ => None,
    }
  }

  /// Error from the last write.
  pub fn error(&self) -> Option<&ApiError> {
    match &self.state {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Run the write. A trigger while pending replaces the earlier one's
  /// result; the earlier request is not cancelled.
  pub fn trigger(&mut self, payload: P) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let future = (self.mutator)(payload);
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }

  /// Poll for the result of a pending write.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(mpsc::error::TryRecvError::Empty) => return false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        Err(ApiError::Network("mutation was cancelled".to_string()))
      }
    };

    self.receiver = None;
    self.state = match result {
      Ok(data) => MutationState::Success(data),
      Err(error) => MutationState::Error(error),
    };
    true
  }

  /// Wait for the pending write to finish. Returns immediately when idle.
  pub async fn settle(&mut self) -> &MutationState<T> {
    if let Some(rx) = &mut self.receiver {
      let result = rx
        .recv()
        .await
        .unwrap_or_else(|| Err(ApiError::Network("mutation was cancelled".to_string())));
      self.receiver = None;
      self.state = match result {
        Ok(data) => MutationState::Success(data),
        Err(error) => MutationState::Error(error),
      };
    }
    &self.state
  }

  /// Back to idle, discarding any pending result.
  pub fn reset(&mut self) {
    self.receiver = None;
    self.state = MutationState::Idle;
  }
}

impl<P, T: std::fmt::Debug> std::fmt::Debug for Mutation<P, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}
