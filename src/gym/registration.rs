//! Gym owner registration and its approval status.

use super::client::GymClient;
use super::types::{MessageResponse, RegisterGymOwnerRequest, RegistrationStatus};
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::{Mutation, Query};

pub const REGISTER_PATH: &str = "/api/gym-owner/register";
pub const REGISTRATION_STATUS_PATH: &str = "/api/gym-owner/registration-status";

pub struct RegistrationKeys;

impl RegistrationKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("registration")
  }

  pub fn status() -> QueryKey {
    Self::all().with("status")
  }
}

pub async fn register_gym_owner(
  api: &ApiClient,
  request: &RegisterGymOwnerRequest,
) -> Result<MessageResponse, ApiError> {
  api
    .post(REGISTER_PATH, request, &RequestOptions::new())
    .await
}

pub async fn get_registration_status(api: &ApiClient) -> Result<RegistrationStatus, ApiError> {
  api
    .get(REGISTRATION_STATUS_PATH, &RequestOptions::new())
    .await
}

impl GymClient {
  /// Submit a gym-owner registration and invalidate the cached status.
  pub async fn register_gym_owner(
    &self,
    request: &RegisterGymOwnerRequest,
  ) -> Result<MessageResponse, ApiError> {
    self
      .write(
        RegistrationKeys::all(),
        register_gym_owner(self.api(), request),
      )
      .await
  }

  /// Approval state of the owner's registration (cached).
  pub async fn registration_status(&self) -> Result<RegistrationStatus, ApiError> {
    let api = self.api().clone();
    self
      .cached(RegistrationKeys::status(), move || async move {
        get_registration_status(&api).await
      })
      .await
  }

  /// Pollable handle over [`GymClient::registration_status`].
  pub fn registration_status_query(&self) -> Query<RegistrationStatus> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      async move { gym.registration_status().await }
    })
  }

  /// Triggerable handle over [`GymClient::register_gym_owner`].
  pub fn register_gym_owner_mutation(&self) -> Mutation<RegisterGymOwnerRequest, MessageResponse> {
    let gym = self.clone();
    Mutation::new(move |request: RegisterGymOwnerRequest| {
      let gym = gym.clone();
      async move { gym.register_gym_owner(&request).await }
    })
  }
}
