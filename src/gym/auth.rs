//! Login, OTP verification and password reset.
//!
//! These are the only calls that write the bearer credential.

use tracing::info;

use super::client::GymClient;
use super::types::{
  ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ResetPasswordRequest,
  VerifyOtpRequest, VerifyOtpResponse,
};
use crate::api::{ApiClient, ApiError, RequestOptions};
use crate::query::Mutation;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const VERIFY_OTP_PATH: &str = "/api/auth/verify-otp";
pub const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";

/// Sign in. Stores the token when the server issues one directly; when it
/// asks for an OTP instead, nothing is stored until [`verify_otp`].
pub async fn login(api: &ApiClient, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
  let response: LoginResponse = api
    .post(LOGIN_PATH, request, &RequestOptions::new())
    .await?;

  if let Some(token) = response.token.as_deref().filter(|t| !t.is_empty()) {
    api.credentials().set(token).map_err(ApiError::storage)?;
    info!("stored credential from login");
  }

  Ok(response)
}

pub async fn verify_otp(
  api: &ApiClient,
  request: &VerifyOtpRequest,
) -> Result<VerifyOtpResponse, ApiError> {
  let response: VerifyOtpResponse = api
    .post(VERIFY_OTP_PATH, request, &RequestOptions::new())
    .await?;

  api
    .credentials()
    .set(&response.token)
    .map_err(ApiError::storage)?;
  info!("stored credential from OTP verification");

  Ok(response)
}

pub async fn forgot_password(
  api: &ApiClient,
  request: &ForgotPasswordRequest,
) -> Result<MessageResponse, ApiError> {
  api
    .post(FORGOT_PASSWORD_PATH, request, &RequestOptions::new())
    .await
}

pub async fn reset_password(
  api: &ApiClient,
  request: &ResetPasswordRequest,
) -> Result<MessageResponse, ApiError> {
  api
    .post(RESET_PASSWORD_PATH, request, &RequestOptions::new())
    .await
}

impl GymClient {
  /// Sign in, dropping reads cached under any previous session.
  pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    let response = login(self.api(), request).await?;
    if response.token.is_some() {
      self.queries().clear();
    }
    Ok(response)
  }

  /// Finish an OTP login, dropping reads cached under any previous session.
  pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<VerifyOtpResponse, ApiError> {
    let response = verify_otp(self.api(), request).await?;
    self.queries().clear();
    Ok(response)
  }

  /// Ask the server to email a password reset OTP.
  pub async fn forgot_password(
    &self,
    request: &ForgotPasswordRequest,
  ) -> Result<MessageResponse, ApiError> {
    forgot_password(self.api(), request).await
  }

  /// Set a new password with a reset OTP. Does not sign in.
  pub async fn reset_password(
    &self,
    request: &ResetPasswordRequest,
  ) -> Result<MessageResponse, ApiError> {
    reset_password(self.api(), request).await
  }

  /// Triggerable handle over [`GymClient::login`].
  pub fn login_mutation(&self) -> Mutation<LoginRequest, LoginResponse> {
    let gym = self.clone();
    Mutation::new(move |request: LoginRequest| {
      let gym = gym.clone();
      async move { gym.login(&request).await }
    })
  }

  /// Triggerable handle over [`GymClient::verify_otp`].
  pub fn verify_otp_mutation(&self) -> Mutation<VerifyOtpRequest, VerifyOtpResponse> {
    let gym = self.clone();
    Mutation::new(move |request: VerifyOtpRequest| {
      let gym = gym.clone();
      async move { gym.verify_otp(&request).await }
    })
  }
}
