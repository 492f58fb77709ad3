use std::time::Duration;

/// Failure of an API call.
///
/// Cloneable so that every caller coalesced onto one in-flight request
/// receives the same outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
  #[error("request path must not be empty")]
  EmptyPath,

  /// HTTP 401. The stored credential has already been cleared.
  #[error("unauthorized: {message}")]
  Unauthorized { message: String },

  #[error("request failed with status {status}: {message}")]
  Status {
    status: u16,
    message: String,
    body: Option<serde_json::Value>,
  },

  #[error("request timed out after {}s", .0.as_secs())]
  Timeout(Duration),

  #[error("network error: {0}")]
  Network(String),

  #[error("failed to decode response: {0}")]
  Decode(String),

  #[error("failed to encode request body: {0}")]
  Encode(String),

  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("client storage error: {0}")]
  Storage(String),
}

impl ApiError {
  /// HTTP status carried by the failure, if the server answered.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized { .. } => Some(401),
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized { .. })
  }

  pub(crate) fn storage(err: color_eyre::Report) -> Self {
    Self::Storage(err.to_string())
  }
}
