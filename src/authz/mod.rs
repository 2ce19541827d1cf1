/// Authorization decision layer
///
/// Pure decision functions evaluated before every state-changing or
/// data-returning operation. No I/O happens here: callers load current
/// state from the store and pass it in, so a denial never leaves partial
/// side effects behind.

use crate::{
    db::models::{ButtonPermission, CustomButton},
    error::{ApiError, ApiResult},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles, closed set with exhaustive matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Superuser across all locations
    Developer,
    /// Site leadership, can manage accounts/buttons/templates at their locations
    Lead,
    /// Office staff
    Office,
    /// Teaching staff
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Lead => "lead",
            Role::Office => "office",
            Role::Teacher => "teacher",
        }
    }

    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "developer" => Ok(Role::Developer),
            "lead" => Ok(Role::Lead),
            "office" => Ok(Role::Office),
            "teacher" => Ok(Role::Teacher),
            _ => Err(ApiError::Validation(format!("Invalid role: {}", s))),
        }
    }

    /// Roles allowed to create/manage accounts, buttons, templates and sends
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Developer | Role::Lead)
    }
}

/// Authenticated caller identity
///
/// Role and memberships are re-read from the store per request; nothing here
/// is cached across requests.
#[derive(Debug, Clone)]
pub struct Identity {
    pub account_id: Uuid,
    pub role: Role,
    pub location_ids: Vec<Uuid>,
}

impl Identity {
    /// The single location-access predicate: developers have implicit access
    /// to every location, everyone else needs a membership row.
    pub fn has_location_access(&self, location_id: Uuid) -> bool {
        self.role == Role::Developer || self.location_ids.contains(&location_id)
    }
}

/// Require developer role (location administration)
pub fn require_developer(identity: &Identity) -> ApiResult<()> {
    if identity.role == Role::Developer {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Developer role required".to_string(),
        ))
    }
}

/// Require a role that may manage accounts, buttons, templates and bulk sends
pub fn require_manager(identity: &Identity) -> ApiResult<()> {
    if identity.role.is_manager() {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Insufficient role for this operation".to_string(),
        ))
    }
}

/// Require access to a specific location
pub fn require_location_access(identity: &Identity, location_id: Uuid) -> ApiResult<()> {
    if identity.has_location_access(location_id) {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "No access to this location".to_string(),
        ))
    }
}

/// Deactivation rules: never self; only a developer may deactivate a
/// developer; leads may deactivate lead/office/teacher accounts; office and
/// teacher roles may deactivate no one.
pub fn check_deactivate(identity: &Identity, target_id: Uuid, target_role: Role) -> ApiResult<()> {
    if identity.account_id == target_id {
        return Err(ApiError::Authorization(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    match identity.role {
        Role::Developer => Ok(()),
        Role::Lead => {
            if target_role == Role::Developer {
                Err(ApiError::Authorization(
                    "Only a developer may deactivate a developer account".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        Role::Office | Role::Teacher => Err(ApiError::Authorization(
            "Insufficient role for this operation".to_string(),
        )),
    }
}

/// Button visibility: developers see every button at an accessible location;
/// otherwise a button is visible iff a permission row matches the caller's
/// role, a permission row matches the caller's account, or the caller
/// created the button.
pub fn button_visible(
    identity: &Identity,
    button: &CustomButton,
    permissions: &[ButtonPermission],
) -> bool {
    if !identity.has_location_access(button.location_id) {
        return false;
    }

    if identity.role == Role::Developer {
        return true;
    }

    if button.created_by == identity.account_id {
        return true;
    }

    permissions.iter().any(|p| {
        p.button_id == button.id
            && (p.role == Some(identity.role) || p.account_id == Some(identity.account_id))
    })
}
