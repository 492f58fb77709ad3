//! The single outbound HTTP path of the crate.
//!
//! Every request goes through [`ApiClient::send`], which attaches the stored
//! bearer credential, applies the fixed timeout, unwraps successful bodies
//! into the caller's type and classifies failures into [`ApiError`].

use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::error::ApiError;
use crate::session::CredentialStore;

/// Applied to every call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

/// Per-request extra headers and query parameters.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  headers: Vec<(String, String)>,
  query: Vec<(String, String)>,
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a header. `Authorization` is ignored at dispatch time.
  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.query.push((name.into(), value.into()));
    self
  }

  /// Add a query parameter only when `value` is present.
  pub fn query_opt(self, name: impl Into<String>, value: Option<&str>) -> Self {
    match value {
      Some(v) => self.query(name, v),
      None => self,
    }
  }
}

/// REST client bound to one base URL and one credential store.
#[derive(Clone, Debug)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  credentials: CredentialStore,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, credentials: CredentialStore) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

    let base_url = base_url.into().trim().trim_end_matches('/').to_string();

    Ok(Self {
      http,
      base_url,
      credentials,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn credentials(&self) -> &CredentialStore {
    &self.credentials
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    options: &RequestOptions,
  ) -> Result<T, ApiError> {
    self.send::<(), T>(Method::GET, path, None, options).await
  }

  pub async fn post<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    self.send(Method::POST, path, Some(body), options).await
  }

  pub async fn put<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    self.send(Method::PUT, path, Some(body), options).await
  }

  pub async fn patch<B, T>(
    &self,
    path: &str,
    body: &B,
    options: &RequestOptions,
  ) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    self.send(Method::PATCH, path, Some(body), options).await
  }

  pub async fn delete<T: DeserializeOwned>(
    &self,
    path: &str,
    options: &RequestOptions,
  ) -> Result<T, ApiError> {
    self.send::<(), T>(Method::DELETE, path, None, options).await
  }

  async fn send<B, T>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
    options: &RequestOptions,
  ) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let url = self.url_for(path, options)?;
    let mut request = self.http.request(method.clone(), url);

    for (name, value) in &options.headers {
      if name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()) {
        debug!(path, "ignoring Authorization header from request options");
        continue;
      }
      request = request.header(name.as_str(), value.as_str());
    }

    if let Some(token) = self.credentials.get().map_err(ApiError::storage)? {
      request = request.bearer_auth(token);
    }

    if let Some(body) = body {
      let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Encode(e.to_string()))?;
      request = request
        .header(header::CONTENT_TYPE, "application/json")
        .body(bytes);
    }

    debug!(%method, path, "dispatching request");

    let response = request.send().await.map_err(classify_transport_error)?;
    let status = response.status();

    debug!(%method, path, status = status.as_u16(), "received response");

    if status == StatusCode::UNAUTHORIZED {
      self.discard_credential();
      let bytes = response.bytes().await.unwrap_or_default();
      let (message, _) = error_details(status, &bytes);
      return Err(ApiError::Unauthorized { message });
    }

    let bytes = response.bytes().await.map_err(classify_transport_error)?;

    if !status.is_success() {
      let (message, body) = error_details(status, &bytes);
      return Err(ApiError::Status {
        status: status.as_u16(),
        message,
        body,
      });
    }

    decode_body(&bytes)
  }

  fn url_for(&self, path: &str, options: &RequestOptions) -> Result<Url, ApiError> {
    let path = path.trim();
    if path.is_empty() {
      return Err(ApiError::EmptyPath);
    }

    let joined = if path.starts_with('/') {
      format!("{}{}", self.base_url, path)
    } else {
      format!("{}/{}", self.base_url, path)
    };

    let mut url =
      Url::parse(&joined).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", joined, e)))?;

    if !options.query.is_empty() {
      let mut pairs = url.query_pairs_mut();
      for (name, value) in &options.query {
        pairs.append_pair(name, value);
      }
    }

    Ok(url)
  }

  /// The server rejected the credential; drop it so it is not sent again.
  fn discard_credential(&self) {
    match self.credentials.clear() {
      Ok(()) => info!("cleared stored credential after 401 response"),
      Err(e) => warn!(error = %e, "failed to clear stored credential after 401 response"),
    }
  }
}

fn classify_transport_error(err: reqwest::Error) -> ApiError {
  if err.is_timeout() {
    ApiError::Timeout(REQUEST_TIMEOUT)
  } else if err.is_builder() {
    ApiError::InvalidRequest(err.to_string())
  } else {
    ApiError::Network(err.to_string())
  }
}

/// Empty bodies decode as JSON `null`, so `()` and `Option<_>` work for 204s.
fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
  let decoded = if bytes.iter().all(u8::is_ascii_whitespace) {
    serde_json::from_value(Value::Null)
  } else {
    serde_json::from_slice(bytes)
  };

  decoded.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Server-provided message (`message` or `error` field) plus the parsed body.
fn error_details(status: StatusCode, bytes: &[u8]) -> (String, Option<Value>) {
  let body: Option<Value> = serde_json::from_slice(bytes).ok();

  let message = body
    .as_ref()
    .and_then(|b| {
      ["message", "error"]
        .iter()
        .find_map(|field| b.get(*field).and_then(Value::as_str))
    })
    .map(String::from)
    .unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
    });

  (message, body)
}
