//! Records exchanged with the dashboard API.
//!
//! The client never owns these; they are values copied out of responses
//! and into request bodies. Everything is camelCase on the wire.

use serde::{Deserialize, Serialize};

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub id: String,
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub gym_name: Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gym_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  pub current_password: String,
  pub new_password: String,
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
  Active,
  Inactive,
  Expired,
  Frozen,
  /// Any status this client does not know yet
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub location_id: Option<String>,
  #[serde(default)]
  pub membership_plan_id: Option<String>,
  pub status: MemberStatus,
  #[serde(default)]
  pub joined_at: Option<String>,
  #[serde(default)]
  pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberPayload {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  pub location_id: String,
  pub membership_plan_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberPayload {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub membership_plan_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<MemberStatus>,
}

// ============================================================================
// Membership plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlan {
  pub id: String,
  pub name: String,
  pub price: f64,
  pub duration_days: u32,
  #[serde(default)]
  pub location_id: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipPlanPayload {
  pub name: String,
  pub price: f64,
  pub duration_days: u32,
  pub location_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipPlanPayload {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_days: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

// ============================================================================
// Locations and documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
  pub id: String,
  pub title: String,
  pub category: String,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub uploaded_at: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

// ============================================================================
// Auth and registration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

/// Either a session token or a request to verify an emailed OTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  #[serde(default)]
  pub token: Option<String>,
  #[serde(default)]
  pub requires_otp: bool,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
  pub email: String,
  pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
  pub token: String,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
  pub email: String,
  pub otp: String,
  pub new_password: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterGymOwnerRequest {
  pub owner_name: String,
  pub email: String,
  pub phone: String,
  pub password: String,
  pub gym_name: String,
  pub address: String,
  pub city: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gst_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
  Pending,
  Approved,
  Rejected,
  /// Any state this client does not know yet
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
  pub status: ApprovalState,
  #[serde(default)]
  pub gym_name: Option<String>,
  #[serde(default)]
  pub submitted_at: Option<String>,
  #[serde(default)]
  pub reason: Option<String>,
}
