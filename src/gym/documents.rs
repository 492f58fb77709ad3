//! Dashboard compliance documents.
//!
//! The only resource that does not propagate read failures: when the list
//! cannot be fetched, the bundled sample list is returned instead.

use tracing::warn;

use super::client::GymClient;
use super::types::Document;
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::cache::QueryKey;
use crate::query::Query;

pub const DOCUMENTS_PATH: &str = "/dashboard/documents";

pub struct DocumentKeys;

impl DocumentKeys {
  pub fn all() -> QueryKey {
    QueryKey::root("dashboard")
  }

  pub fn list() -> QueryKey {
    Self::all().with("documents")
  }
}

/// Fetch the document list, degrading to [`fallback_documents`] on any failure.
pub async fn get_documents(api: &ApiClient) -> Vec<Document> {
  match api
    .get::<Vec<Document>>(DOCUMENTS_PATH, &RequestOptions::new())
    .await
  {
    Ok(documents) => documents,
    Err(e) => {
      warn!(error = %e, "document list unavailable, serving bundled sample");
      fallback_documents()
    }
  }
}

/// Sample list shown when the documents endpoint fails.
pub fn fallback_documents() -> Vec<Document> {
  [
    ("doc-1", "Gym registration certificate", "registration"),
    ("doc-2", "Fire safety certificate", "safety"),
    ("doc-3", "GST registration", "tax"),
    ("doc-4", "Trade license", "license"),
  ]
  .into_iter()
  .map(|(id, title, category)| Document {
    id: id.to_string(),
    title: title.to_string(),
    category: category.to_string(),
    url: None,
    uploaded_at: None,
    status: Some("pending".to_string()),
  })
  .collect()
}

impl GymClient {
  /// Compliance documents (cached). Never fails on transport errors; see [`get_documents`].
  pub async fn documents(&self) -> Result<Vec<Document>, ApiError> {
    let api = self.api().clone();
    self
      .cached(DocumentKeys::list(), move || async move {
        Ok(get_documents(&api).await)
      })
      .await
  }

  /// Pollable handle over [`GymClient::documents`].
  pub fn documents_query(&self) -> Query<Vec<Document>> {
    let gym = self.clone();
    Query::new(move || {
      let gym = gym.clone();
      async move { gym.documents().await }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gym::test_support::gym_for;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_documents_from_api() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(DOCUMENTS_PATH))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "d9", "title": "Lease agreement", "category": "legal" }
      ])))
      .expect(1)
      .mount(&server)
      .await;

    let documents = get_documents(gym.api()).await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "Lease agreement");
  }

  #[tokio::test]
  async fn test_network_error_yields_fallback() {
    let (gym, _credentials) = gym_for("http://127.0.0.1:1");

    let documents = get_documents(gym.api()).await;
    assert_eq!(documents, fallback_documents());
  }

  #[tokio::test]
  async fn test_server_error_yields_fallback() {
    let server = MockServer::start().await;
    let (gym, _credentials) = gym_for(&server.uri());

    Mock::given(method("GET"))
      .and(path(DOCUMENTS_PATH))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let documents = gym.documents().await.unwrap();
    assert_eq!(documents, fallback_documents());
  }

  #[tokio::test]
  async fn test_fallback_still_clears_credential_on_401() {
    let server = MockServer::start().await;
    let (gym, credentials) = gym_for(&server.uri());
    credentials.set("tok123").unwrap();

    Mock::given(method("GET"))
      .and(path(DOCUMENTS_PATH))
      .respond_with(ResponseTemplate::new(401))
      .mount(&server)
      .await;

    assert_eq!(get_documents(gym.api()).await, fallback_documents());
    assert_eq!(credentials.get().unwrap(), None);
  }

  #[tokio::test]
  async fn test_documents_query_succeeds_offline() {
    let (gym, _credentials) = gym_for("http://127.0.0.1:1");
    let mut query = gym.documents_query();

    query.fetch();
    assert!(query.settle().await.is_success());
    assert_eq!(query.data().map(Vec::len), Some(4));
  }
}
