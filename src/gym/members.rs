//! Gym members.

use super::client::GymClient;
use super::types::{CreateMemberPayload, Member, UpdateMemberPayload};
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::{Mutation, Query};

pub const MEMBERS_PATH: &str = "/api/gym-owner/dashboard/members";

/// Query keys for member reads. Every key starts with [`MemberKeys::all`].
pub struct MemberKeys;

impl MemberKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("members")
  }

  /// `None` is its own entry, never shared with any location's list.
  pub fn list(location_id: Option<&str>) -> QueryKey {
    Self::all().with("list").with(location_id)
  }

  pub fn detail(member_id: &str) -> QueryKey {
    Self::all().with("detail").with(member_id)
  }
}

fn member_path(member_id: &str) -> String {
  format!("{}/{}", MEMBERS_PATH, member_id)
}

pub async fn get_members(api: &ApiClient, location_id: Option<&str>) -> Result<Vec<Member>, ApiError> {
  let options = RequestOptions::new().query_opt("locationId", location_id);
  api.get(MEMBERS_PATH, &options).await
}

pub async fn get_member(api: &ApiClient, member_id: &str) -> Result<Member, ApiError> {
  api
    .get(&member_path(member_id), &RequestOptions::new())
    .await
}

pub async fn create_member(api: &ApiClient, payload: &CreateMemberPayload) -> Result<Member, ApiError> {
  api.post(MEMBERS_PATH, payload, &RequestOptions::new()).await
}

pub async fn update_member(
  api: &ApiClient,
  member_id: &str,
  payload: &UpdateMemberPayload,
) -> Result<Member, ApiError> {
  api
    .put(&member_path(member_id), payload, &RequestOptions::new())
    .await
}

impl GymClient {
  /// Members of a location, or of every location when `location_id` is `None` (cached).
  pub async fn members(&self, location_id: Option<&str>) -> Result<Vec<Member>, ApiError> {
    let key = MemberKeys::list(location_id);
    let api = self.api().clone();
    let location_id = location_id.map(String::from);

    self
      .cached(key, move || async move {
        get_members(&api, location_id.as_deref()).await
      })
      .await
  }

  /// A single member by id (cached).
  pub async fn member(&self, member_id: &str) -> Result<Member, ApiError> {
    let api = self.api().clone();
    let member_id = member_id.to_string();

    self
      .cached(MemberKeys::detail(&member_id), move || async move {
        get_member(&api, &member_id).await
      })
      .await
  }

  /// Create a member and invalidate every cached member read.
  pub async fn create_member(&self, payload: &CreateMemberPayload) -> Result<Member, ApiError> {
    self
      .write(MemberKeys::all(), create_member(self.api(), payload))
      .await
  }

  /// Update a member and invalidate every cached member read.
  pub async fn update_member(
    &self,
    member_id: &str,
    payload: &UpdateMemberPayload,
  ) -> Result<Member, ApiError> {
    self
      .write(
        MemberKeys::all(),
        update_member(self.api(), member_id, payload),
      )
      .await
  }

  /// Pollable handle over [`GymClient::members`].
  pub fn members_query(&self, location_id: Option<String>) -> Query<Vec<Member>> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      let location_id = location_id.clone();
      async move { gym.members(location_id.as_deref()).await }
    })
  }

  /// Triggerable handle over [`GymClient::create_member`].
  pub fn create_member_mutation(&self) -> Mutation<CreateMemberPayload, Member> {
    let gym = self.clone();
    Mutation::new(move |payload: CreateMemberPayload| {
      let gym = gym.clone();
      async move { gym.create_member(&payload).await }
    })
  }

  /// Triggerable handle over [`GymClient::update_member`]; the payload is `(member_id, changes)`.
  pub fn update_member_mutation(&self) -> Mutation<(String, UpdateMemberPayload), Member> {
    let gym = self.clone();
    Mutation::new(move |(member_id, payload): (String, UpdateMemberPayload)| {
      let gym = gym.clone();
      async move { gym.update_member(&member_id, &payload).await }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gym::test_support::gym_for;
  use crate::gym::types::MemberStatus;
  use serde_json::json;
  use std::time::Duration;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn member_json(id: &str, location: &str) -> serde_json::Value {
    json!({ "id": id, "name": "Ada", "locationId": location, "status": "active" })
  }

  fn new_member() -> CreateMemberPayload {
    CreateMemberPayload {
      name: "Grace".to_string(),
      email: Some("grace@example.com".to_string()),
      phone: None,
      location_id: "loc-1".to_string(),
      membership_plan_id: "plan-1".to_string(),
      start_date: None,
    }
  }

  #[tokio::test]
  async fn test_create_member_invalidates_unfiltered_list() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([member_json("m1", "loc-1")])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(201).set_body_json(member_json("m2", "loc-1")))
      .expect(1)
      .mount(&server)
      .await;

    gym.members(None).await.unwrap();
    // Served from cache
    gym.members(None).await.unwrap();
    assert!(gym.queries().peek::<Vec<Member>>(&MemberKeys::list(None)).is_some());

    let created = gym.create_member(&new_member()).await.unwrap();
    assert_eq!(created.id, "m2");
    assert!(gym.queries().peek::<Vec<Member>>(&MemberKeys::list(None)).is_none());

    // Refetched after the write
    gym.members(None).await.unwrap();
  }

  #[tokio::test]
  async fn test_location_filter_is_a_separate_entry() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .and(query_param("locationId", "loc-2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([member_json("m5", "loc-2")])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let filtered = gym.members(Some("loc-2")).await.unwrap();
    let unfiltered = gym.members(None).await.unwrap();

    assert_eq!(filtered.len(), 1);
    assert!(unfiltered.is_empty());
  }

  #[tokio::test]
  async fn test_concurrent_reads_make_one_request() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([member_json("m1", "loc-1")]))
          .set_delay(Duration::from_millis(100)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let (a, b) = tokio::join!(gym.members(Some("loc-1")), gym.members(Some("loc-1")));
    assert_eq!(a.unwrap(), b.unwrap());
  }

  #[tokio::test]
  async fn test_abandoned_read_settles_for_the_next_caller() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([member_json("m1", "loc-1")]))
          .set_delay(Duration::from_millis(150)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let abandoned = tokio::time::timeout(Duration::from_millis(20), gym.members(None)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!gym.queries().is_fetching(&MemberKeys::list(None)));

    let members = gym.members(None).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, "m1");
  }

  #[tokio::test]
  async fn test_update_member_invalidates_detail() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(format!("{}/m1", MEMBERS_PATH)))
      .respond_with(ResponseTemplate::new(200).set_body_json(member_json("m1", "loc-1")))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("PUT"))
      .and(path(format!("{}/m1", MEMBERS_PATH)))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": "m1", "name": "Ada", "status": "frozen"
      })))
      .expect(1)
      .mount(&server)
      .await;

    gym.member("m1").await.unwrap();

    let mut mutation = gym.update_member_mutation();
    mutation.trigger((
      "m1".to_string(),
      UpdateMemberPayload {
        status: Some(MemberStatus::Frozen),
        ..Default::default()
      },
    ));
    mutation.settle().await;
    assert_eq!(mutation.data().map(|m| m.status), Some(MemberStatus::Frozen));

    gym.member("m1").await.unwrap();
  }

  #[tokio::test]
  async fn test_failed_create_keeps_cached_list() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Plan not found" })))
      .mount(&server)
      .await;

    gym.members(None).await.unwrap();
    let err = gym.create_member(&new_member()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    gym.members(None).await.unwrap();
  }

  #[tokio::test]
  async fn test_members_query_hook() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(MEMBERS_PATH))
      .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "db down" })))
      .mount(&server)
      .await;

    let mut query = gym.members_query(None);
    query.fetch();
    query.settle().await;

    assert!(query.is_error());
    assert_eq!(query.error().and_then(ApiError::status), Some(500));
  }
}
