//! Gym locations owned by the signed-in account.

use super::client::GymClient;
use super::types::Location;
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::Query;

pub const LOCATIONS_PATH: &str = "/api/gym-owner/dashboard/locations";

pub struct LocationKeys;

impl LocationKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("locations")
  }

  pub fn list() -> QueryKey {
    Self::all().with("list")
  }
}

pub async fn get_locations(api: &ApiClient) -> Result<Vec<Location>, ApiError> {
  api.get(LOCATIONS_PATH, &RequestOptions::new()).await
}

impl GymClient {
  /// Gym locations owned by the signed-in account (cached).
  pub async fn locations(&self) -> Result<Vec<Location>, ApiError> {
    let api = self.api().clone();
    self
      .cached(LocationKeys::list(), move || async move {
        get_locations(&api).await
      })
      .await
  }

  /// Pollable handle over [`GymClient::locations`].
  pub fn locations_query(&self) -> Query<Vec<Location>> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      async move { gym.locations().await }
    })
  }

  /// The persisted location filter, if it still names one of `locations()`.
  pub async fn selected_location(&self) -> Result<Option<Location>, ApiError> {
    let Some(selected) = self.locations_store().selected().map_err(ApiError::storage)? else {
      return Ok(None);
    };

    let locations = self.locations().await?;
    Ok(locations.into_iter().find(|l| l.id == selected))
  }
}
