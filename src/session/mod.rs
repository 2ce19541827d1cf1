/// Identity & session management
///
/// Verifies credential pairs, mints signed time-limited session tokens, and
/// drives the single-use password reset flow.

mod manager;

pub use manager::{hash_password, verify_password, SessionClaims, SessionManager};
pub(crate) use manager::account_from_row;

use crate::authz::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub account_id: Uuid,
    pub role: Role,
    pub location_ids: Vec<Uuid>,
    pub expires_at: DateTime<Utc>,
}

/// Password reset request (public endpoint, no auth)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPasswordResetRequest {
    pub email: String,
}

/// Password reset submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}
