//! Gym owner profile.

use super::client::GymClient;
use super::types::{ChangePasswordPayload, MessageResponse, Profile, UpdateProfilePayload};
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::{Mutation, Query};

pub const PROFILE_PATH: &str = "/api/profile";
pub const CHANGE_PASSWORD_PATH: &str = "/api/profile/change-password";

pub struct ProfileKeys;

impl ProfileKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("profile")
  }

  pub fn detail() -> QueryKey {
    Self::all().with("detail")
  }
}

pub async fn get_profile(api: &ApiClient) -> Result<Profile, ApiError> {
  api.get(PROFILE_PATH, &RequestOptions::new()).await
}

pub async fn update_profile(
  api: &ApiClient,
  payload: &UpdateProfilePayload,
) -> Result<Profile, ApiError> {
  api.put(PROFILE_PATH, payload, &RequestOptions::new()).await
}

pub async fn change_password(
  api: &ApiClient,
  payload: &ChangePasswordPayload,
) -> Result<MessageResponse, ApiError> {
  api
    .post(CHANGE_PASSWORD_PATH, payload, &RequestOptions::new())
    .await
}

impl GymClient {
  /// Signed-in owner's profile (cached).
  pub async fn profile(&self) -> Result<Profile, ApiError> {
    let api = self.api().clone();
    self
      .cached(ProfileKeys::detail(), move || async move {
        get_profile(&api).await
      })
      .await
  }

  /// Update the profile and invalidate cached profile reads.
  pub async fn update_profile(&self, payload: &UpdateProfilePayload) -> Result<Profile, ApiError> {
    self
      .write(ProfileKeys::all(), update_profile(self.api(), payload))
      .await
  }

  /// Change the owner's password and invalidate cached profile reads.
  pub async fn change_password(
    &self,
    payload: &ChangePasswordPayload,
  ) -> Result<MessageResponse, ApiError> {
    self
      .write(ProfileKeys::all(), change_password(self.api(), payload))
      .await
  }

  /// Pollable handle over [`GymClient::profile`].
  pub fn profile_query(&self) -> Query<Profile> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      async move { gym.profile().await }
    })
  }

  /// Triggerable handle over [`GymClient::update_profile`].
  pub fn update_profile_mutation(&self) -> Mutation<UpdateProfilePayload, Profile> {
    let gym = self.clone();
    Mutation::new(move |payload: UpdateProfilePayload| {
      let gym = gym.clone();
      async move { gym.update_profile(&payload).await }
    })
  }

  /// Triggerable handle over [`GymClient::change_password`].
  pub fn change_password_mutation(&self) -> Mutation<ChangePasswordPayload, MessageResponse> {
    let gym = self.clone();
    Mutation::new(move |payload: ChangePasswordPayload| {
      let gym = gym.clone();
      async move { gym.change_password(&payload).await }
    })
  }
}
