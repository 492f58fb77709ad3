//! Result metadata returned by the query cache.

use chrono::{DateTime, Utc};

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Data produced by a request this caller started.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Data produced by a request another caller had already started.
  pub fn from_in_flight(data: T) -> Self {
    Self {
      data,
      source: CacheSource::InFlight,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from a request this caller issued
  Network,
  /// Joined a request already in flight for the same key
  InFlight,
  /// Served from a fresh cache entry
  Cache,
}
