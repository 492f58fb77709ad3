//! Membership plans offered at each location.

use super::client::GymClient;
use super::types::{CreateMembershipPlanPayload, MembershipPlan, UpdateMembershipPlanPayload};
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::{Mutation, Query};

pub const MEMBERSHIP_PLANS_PATH: &str = "/api/gym-owner/dashboard/membership-plans";

pub struct MembershipPlanKeys;

impl MembershipPlanKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("membership-plans")
  }

  pub fn list(location_id: Option<&str>) -> QueryKey {
    Self::all().with("list").with(location_id)
  }
}

pub async fn get_membership_plans(
  api: &ApiClient,
  location_id: Option<&str>,
) -> Result<Vec<MembershipPlan>, ApiError> {
  let options = RequestOptions::new().query_opt("locationId", location_id);
  api.get(MEMBERSHIP_PLANS_PATH, &options).await
}

pub async fn create_membership_plan(
  api: &ApiClient,
  payload: &CreateMembershipPlanPayload,
) -> Result<MembershipPlan, ApiError> {
  api
    .post(MEMBERSHIP_PLANS_PATH, payload, &RequestOptions::new())
    .await
}

pub async fn update_membership_plan(
  api: &ApiClient,
  plan_id: &str,
  payload: &UpdateMembershipPlanPayload,
) -> Result<MembershipPlan, ApiError> {
  let path = format!("{}/{}", MEMBERSHIP_PLANS_PATH, plan_id);
  api.put(&path, payload, &RequestOptions::new()).await
}

impl GymClient {
  /// Membership plans of a location, or all plans when `location_id` is `None` (cached).
  pub async fn membership_plans(
    &self,
    location_id: Option<&str>,
  ) -> Result<Vec<MembershipPlan>, ApiError> {
    let key = MembershipPlanKeys::list(location_id);
    let api = self.api().clone();
    let location_id = location_id.map(String::from);

    self
      .cached(key, move || async move {
        get_membership_plans(&api, location_id.as_deref()).await
      })
      .await
  }

  /// Create a plan and invalidate every cached plan read.
  pub async fn create_membership_plan(
    &self,
    payload: &CreateMembershipPlanPayload,
  ) -> Result<MembershipPlan, ApiError> {
    self
      .write(
        MembershipPlanKeys::all(),
        create_membership_plan(self.api(), payload),
      )
      .await
  }

  /// Update a plan and invalidate every cached plan read.
  pub async fn update_membership_plan(
    &self,
    plan_id: &str,
    payload: &UpdateMembershipPlanPayload,
  ) -> Result<MembershipPlan, ApiError> {
    self
      .write(
        MembershipPlanKeys::all(),
        update_membership_plan(self.api(), plan_id, payload),
      )
      .await
  }

  /// Pollable handle over [`GymClient::membership_plans`].
  pub fn membership_plans_query(&self, location_id: Option<String>) -> Query<Vec<MembershipPlan>> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      let location_id = location_id.clone();
      async move { gym.membership_plans(location_id.as_deref()).await }
    })
  }

  /// Triggerable handle over [`GymClient::create_membership_plan`].
  pub fn create_membership_plan_mutation(
    &self,
  ) -> Mutation<CreateMembershipPlanPayload, MembershipPlan> {
    let gym = self.clone();
    Mutation::new(move |payload: CreateMembershipPlanPayload| {
      let gym = gym.clone();
      async move { gym.create_membership_plan(&payload).await }
    })
  }

  /// Triggerable handle over [`GymClient::update_membership_plan`]; the payload is `(plan_id, changes)`.
  pub fn update_membership_plan_mutation(
    &self,
  ) -> Mutation<(String, UpdateMembershipPlanPayload), MembershipPlan> {
    let gym = self.clone();
    Mutation::new(
      move |(plan_id, payload): (String, UpdateMembershipPlanPayload)| {
        let gym = gym.clone();
        async move { gym.update_membership_plan(&plan_id, &payload).await }
      },
    )
  }
}
