/// Row models for all persisted entities
use crate::authz::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub deactivated_by: Option<Uuid>,
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Single-use password reset token, cleared on consumption
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Location (tenant/site) record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Custom quick-access button, scoped to exactly one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomButton {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub location_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Button visibility grant: exactly one of role / account_id is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPermission {
    pub button_id: Uuid,
    pub role: Option<Role>,
    pub account_id: Option<Uuid>,
}

/// Email template with a `{{name}}` placeholder in subject/body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub location_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-recipient outcome of a bulk send; status is the only mutable field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEmail {
    pub id: Uuid,
    pub recipient_email: String,
    pub recipient_name: String,
    pub template_id: Option<Uuid>,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub status: SendStatus,
    pub location_id: Uuid,
    pub sent_at: DateTime<Utc>,
}

/// Delivery status of a sent email record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Failed,
    Resent,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
            SendStatus::Resent => "resent",
        }
    }

    pub fn from_str(s: &str) -> crate::error::ApiResult<Self> {
        match s {
            "sent" => Ok(SendStatus::Sent),
            "failed" => Ok(SendStatus::Failed),
            "resent" => Ok(SendStatus::Resent),
            _ => Err(crate::error::ApiError::Internal(format!(
                "Invalid send status in store: {}",
                s
            ))),
        }
    }
}
