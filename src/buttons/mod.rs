/// Custom quick-access buttons
///
/// Buttons are named external links scoped to a location; visibility is
/// governed by role/account permission rows and creator ownership.

mod manager;

pub use manager::ButtonManager;

use crate::authz::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Button creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateButtonRequest {
    pub name: String,
    pub url: String,
    pub location_id: Uuid,
}

/// One permission grant: exactly one of role / account_id must be set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSpec {
    pub role: Option<Role>,
    pub account_id: Option<Uuid>,
}

/// Full-replacement permission set for a button
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetButtonPermissionsRequest {
    pub permissions: Vec<PermissionSpec>,
}
