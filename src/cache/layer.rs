//! In-memory query cache with per-key request coalescing.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, trace};

use super::key::QueryKey;
use super::traits::{CacheResult, CacheSource};
use crate::api::ApiError;

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

enum Entry {
  /// A request is in flight; later readers await the same future.
  Pending {
    fetch: SharedFetch,
    generation: u64,
  },
  Ready {
    value: CachedValue,
    cached_at: DateTime<Utc>,
  },
}

#[derive(Default)]
struct Entries {
  map: HashMap<QueryKey, Entry>,
  next_generation: u64,
}

enum Lookup<T> {
  Hit(T, DateTime<Utc>),
  Join(SharedFetch),
  Miss,
}

/// Cache of query results keyed by [`QueryKey`].
///
/// - A fresh entry is returned without calling the fetcher.
/// - Readers of a key that is already being fetched join that request.
/// - Failed fetches are not cached.
/// - [`QueryClient::invalidate`] drops every entry under a key prefix,
///   including in-flight ones, so the next read refetches.
#[derive(Clone)]
pub struct QueryClient {
  entries: Arc<Mutex<Entries>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(Entries::default())),
      stale_time: Duration::from_secs(300),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn lock(&self) -> MutexGuard<'_, Entries> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    (Utc::now() - cached_at)
      .to_std()
      .map(|age| age > self.stale_time)
      .unwrap_or(false)
  }

  /// Read `key`, calling `fetcher` only when no fresh entry and no in-flight
  /// request exist for it.
  pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<CacheResult<T>, ApiError>
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let (fetch, source) = {
      let mut entries = self.lock();

      let lookup = match entries.map.get(key) {
        Some(Entry::Ready { value, cached_at }) if !self.is_stale(*cached_at) => {
          match value.downcast_ref::<T>() {
            Some(data) => Lookup::Hit(data.clone(), *cached_at),
            None => Lookup::Miss,
          }
        }
        Some(Entry::Pending { fetch, .. }) => Lookup::Join(fetch.clone()),
        _ => Lookup::Miss,
      };

      match lookup {
        Lookup::Hit(data, cached_at) => {
          trace!(%key, "query cache hit");
          return Ok(CacheResult::from_cache(data, cached_at));
        }
        Lookup::Join(fetch) => {
          debug!(%key, "joining in-flight query");
          (fetch, CacheSource::InFlight)
        }
        Lookup::Miss => {
          debug!(%key, "query cache miss, fetching");
          (self.start(&mut entries, key, fetcher), CacheSource::Network)
        }
      }
    };

    let value = fetch.await?;
    let data = value.downcast_ref::<T>().cloned().ok_or_else(|| {
      ApiError::Decode(format!("cached value for {} has an unexpected type", key))
    })?;

    Ok(match source {
      CacheSource::InFlight => CacheResult::from_in_flight(data),
      _ => CacheResult::from_network(data),
    })
  }

  /// Install a pending entry for `key` and return its shared request.
  ///
  /// The request runs on its own task and records its outcome there, so the
  /// entry settles even if every caller stops waiting.
  fn start<T, F, Fut>(&self, entries: &mut Entries, key: &QueryKey, fetcher: F) -> SharedFetch
  where
    T: Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let generation = entries.next_generation;
    entries.next_generation += 1;

    let store: Weak<Mutex<Entries>> = Arc::downgrade(&self.entries);
    let entry_key = key.clone();
    let request = fetcher();

    let fetch = async move {
      let outcome = request.await.map(|data| Arc::new(data) as CachedValue);

      if let Some(store) = store.upgrade() {
        let mut entries = store.lock().unwrap_or_else(PoisonError::into_inner);
        let still_current = matches!(
          entries.map.get(&entry_key),
          Some(Entry::Pending { generation: g, .. }) if *g == generation
        );

        // An invalidated request still answers its callers but leaves the
        // cache alone.
        if still_current {
          match &outcome {
            Ok(value) => {
              entries.map.insert(
                entry_key,
                Entry::Ready {
                  value: Arc::clone(value),
                  cached_at: Utc::now(),
                },
              );
            }
            Err(_) => {
              entries.map.remove(&entry_key);
            }
          }
        }
      }

      outcome
    }
    .boxed()
    .shared();

    entries.map.insert(
      key.clone(),
      Entry::Pending {
        fetch: fetch.clone(),
        generation,
      },
    );

    tokio::spawn(fetch.clone());

    fetch
  }

  /// Drop every entry whose key starts with `prefix`. Returns how many went.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.lock();
    let before = entries.map.len();
    entries.map.retain(|key, _| !key.starts_with(prefix));
    let removed = before - entries.map.len();

    debug!(%prefix, removed, "invalidated queries");
    removed
  }

  /// Drop everything.
  pub fn clear(&self) {
    self.lock().map.clear();
  }

  /// Cached value for `key` without fetching, fresh or not.
  pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
    match self.lock().map.get(key) {
      Some(Entry::Ready { value, .. }) => value.downcast_ref::<T>().cloned(),
      _ => None,
    }
  }

  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    matches!(self.lock().map.get(key), Some(Entry::Pending { .. }))
  }

  pub fn len(&self) -> usize {
    self.lock().map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl std::fmt::Debug for QueryClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryClient")
      .field("entries", &self.len())
      .field("stale_time", &self.stale_time)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn members(location: Option<&str>) -> QueryKey {
    QueryKey::root("members").with("list").with(location)
  }

  fn counting<T: Clone + Send + 'static>(
    counter: &Arc<AtomicUsize>,
    value: T,
    delay: Duration,
  ) -> impl FnOnce() -> BoxFuture<'static, Result<T, ApiError>> {
    let counter = counter.clone();
    move || {
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        Ok(value)
      }
      .boxed()
    }
  }

  #[tokio::test]
  async fn test_second_read_served_from_cache() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = members(None);

    let first = cache
      .fetch(&key, counting(&calls, vec![1, 2], Duration::ZERO))
      .await
      .unwrap();
    let second = cache
      .fetch(&key, counting(&calls, vec![9], Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, vec![1, 2]);
    assert!(second.cached_at.is_some());
  }

  #[tokio::test]
  async fn test_concurrent_reads_coalesce() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = members(Some("loc-1"));

    let (a, b) = tokio::join!(
      cache.fetch(&key, counting(&calls, "payload".to_string(), Duration::from_millis(50))),
      cache.fetch(&key, counting(&calls, "other".to_string(), Duration::from_millis(50))),
    );

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.data, "payload");
    assert_eq!(b.data, "payload");
    assert_eq!(a.source, CacheSource::Network);
    assert_eq!(b.source, CacheSource::InFlight);
  }

  #[tokio::test]
  async fn test_distinct_keys_never_share() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let absent = cache
      .fetch(&members(None), counting(&calls, "all", Duration::ZERO))
      .await
      .unwrap();
    let empty = cache
      .fetch(&members(Some("")), counting(&calls, "empty", Duration::ZERO))
      .await
      .unwrap();
    let loc = cache
      .fetch(&members(Some("loc-1")), counting(&calls, "loc-1", Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!((absent.data, empty.data, loc.data), ("all", "empty", "loc-1"));
    assert_eq!(cache.len(), 3);
  }

  #[tokio::test]
  async fn test_invalidate_prefix_forces_refetch() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let plans = QueryKey::root("membership-plans").with("list").with(None::<&str>);

    for key in [&members(None), &members(Some("loc-1")), &plans] {
      cache
        .fetch(key, counting(&calls, 1u32, Duration::ZERO))
        .await
        .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    assert_eq!(cache.invalidate(&QueryKey::root("members")), 2);

    let refetched = cache
      .fetch(&members(None), counting(&calls, 2u32, Duration::ZERO))
      .await
      .unwrap();
    let untouched = cache
      .fetch(&plans, counting(&calls, 2u32, Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(refetched.source, CacheSource::Network);
    assert_eq!(refetched.data, 2);
    assert_eq!(untouched.source, CacheSource::Cache);
    assert_eq!(untouched.data, 1);
  }

  #[tokio::test]
  async fn test_invalidated_in_flight_request_does_not_repopulate() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = members(None);

    let slow = {
      let cache = cache.clone();
      let key = key.clone();
      let fetcher = counting(&calls, "before-write", Duration::from_millis(100));
      tokio::spawn(async move { cache.fetch(&key, fetcher).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.is_fetching(&key));
    cache.invalidate(&QueryKey::root("members"));

    let fresh = cache
      .fetch(&key, counting(&calls, "after-write", Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(fresh.source, CacheSource::Network);
    assert_eq!(fresh.data, "after-write");

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale.data, "before-write");

    assert_eq!(cache.peek::<&str>(&key), Some("after-write"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_errors_are_not_cached() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::root("profile").with("detail");

    let failing = {
      let calls = calls.clone();
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<String, _>(ApiError::Network("connection reset".to_string()))
      }
    };
    let err = cache.fetch(&key, failing).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert!(cache.is_empty());

    let ok = cache
      .fetch(&key, counting(&calls, "profile".to_string(), Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(ok.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_abandoned_read_still_settles() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = members(None);

    let abandoned = tokio::time::timeout(
      Duration::from_millis(10),
      cache.fetch(&key, counting(&calls, "first", Duration::from_millis(50))),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!cache.is_fetching(&key));
    assert_eq!(cache.peek::<&str>(&key), Some("first"));

    let next = cache
      .fetch(&key, counting(&calls, "second", Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(next.source, CacheSource::Cache);
    assert_eq!(next.data, "first");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_abandoned_failed_read_leaves_no_entry() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::root("profile").with("detail");

    let failing = {
      let calls = calls.clone();
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err::<String, _>(ApiError::Network("connection reset".to_string()))
      }
    };
    let abandoned = tokio::time::timeout(Duration::from_millis(10), cache.fetch(&key, failing)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cache.is_empty());

    let next = cache
      .fetch(&key, counting(&calls, "profile".to_string(), Duration::ZERO))
      .await
      .unwrap();
    assert_eq!(next.source, CacheSource::Network);
    assert_eq!(next.data, "profile");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_joined_callers_share_the_error() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::root("profile").with("detail");

    let failing = || {
      let calls = calls.clone();
      move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        Err::<String, _>(ApiError::Status {
          status: 500,
          message: "boom".to_string(),
          body: None,
        })
      }
    };

    let (a, b) = tokio::join!(cache.fetch(&key, failing()), cache.fetch(&key, failing()));
    assert_eq!(a.unwrap_err().status(), Some(500));
    assert_eq!(b.unwrap_err().status(), Some(500));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_entries_refetch() {
    let cache = QueryClient::new().with_stale_time(Duration::ZERO);
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::root("locations").with("list");

    cache
      .fetch(&key, counting(&calls, 1u8, Duration::ZERO))
      .await
      .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = cache
      .fetch(&key, counting(&calls, 2u8, Duration::ZERO))
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::Network);
    assert_eq!(second.data, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_clear() {
    let cache = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .fetch(&members(None), counting(&calls, 1u8, Duration::ZERO))
      .await
      .unwrap();
    assert!(!cache.is_empty());

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.peek::<u8>(&members(None)), None);
  }
}
