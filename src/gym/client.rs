//! Dashboard client combining the transport with the query cache.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cache::{QueryClient, QueryKey};
use crate::config::Config;
use crate::session::{CredentialStore, LocationStore};
use crate::storage::ClientStorage;

/// Dashboard API client with transparent caching.
///
/// Reads go through the query cache; writes go straight to the API and, on
/// success, invalidate the cache entries of the resource family they touch.
/// The per-resource methods live next to their request functions in the
/// sibling modules.
#[derive(Clone, Debug)]
pub struct GymClient {
  api: ApiClient,
  queries: QueryClient,
  locations: LocationStore,
}

impl GymClient {
  /// Build a client from configuration over the given persisted storage.
  pub fn new(config: &Config, storage: Arc<dyn ClientStorage>) -> Result<Self> {
    let credentials = CredentialStore::new(Arc::clone(&storage));
    let api = ApiClient::new(config.base_url(), credentials)?;
    let queries = QueryClient::new().with_stale_time(config.stale_time());

    Ok(Self::from_parts(api, queries, LocationStore::new(storage)))
  }

  /// Assemble a client from already built parts.
  pub fn from_parts(api: ApiClient, queries: QueryClient, locations: LocationStore) -> Self {
    Self {
      api,
      queries,
      locations,
    }
  }

  /// Underlying transport, for requests that bypass the cache.
  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  /// The query cache shared by every clone of this client.
  pub fn queries(&self) -> &QueryClient {
    &self.queries
  }

  pub fn credentials(&self) -> &CredentialStore {
    self.api.credentials()
  }

  pub fn locations_store(&self) -> &LocationStore {
    &self.locations
  }

  /// Cached read of `key`.
  pub(crate) async fn cached<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    self.queries.fetch(&key, fetcher).await.map(|r| r.data)
  }

  /// Run a write and, if it succeeds, invalidate everything under `scope`.
  pub(crate) async fn write<T, Fut>(&self, scope: QueryKey, request: Fut) -> Result<T, ApiError>
  where
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let result = request.await?;
    self.queries.invalidate(&scope);
    Ok(result)
  }

  /// Forget the session: clear the credential and every cached read.
  pub fn logout(&self) -> Result<(), ApiError> {
    self.credentials().clear().map_err(ApiError::storage)?;
    self.queries.clear();
    tracing::info!("logged out");
    Ok(())
  }
}
