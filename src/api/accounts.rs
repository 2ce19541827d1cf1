/// Account endpoints
use crate::{
    account::{AccountInfo, CreateAccountRequest},
    auth::AuthContext,
    authz,
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/accounts", post(create_account))
        .route("/api/accounts/:id/deactivate", post(deactivate_account))
        .route("/api/locations/:id/accounts", get(list_accounts))
}

/// Create an account with its location memberships
async fn create_account(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Json<AccountInfo>> {
    authz::require_manager(&auth.identity)?;

    // A lead can only place accounts at locations they can reach themselves
    for location_id in &req.location_ids {
        authz::require_location_access(&auth.identity, *location_id)?;
        if !ctx.location_manager.location_exists(*location_id).await? {
            return Err(ApiError::NotFound("Location not found".to_string()));
        }
    }

    let account = ctx
        .account_manager
        .create_account(
            &req.email,
            &req.password,
            req.role,
            &req.location_ids,
            auth.identity.account_id,
        )
        .await?;

    Ok(Json(AccountInfo {
        id: account.id,
        email: account.email,
        role: account.role,
        is_active: account.is_active,
        created_at: account.created_at,
    }))
}

/// List accounts at a location
async fn list_accounts(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AccountInfo>>> {
    authz::require_manager(&auth.identity)?;
    authz::require_location_access(&auth.identity, location_id)?;

    let accounts = ctx.account_manager.list_accounts_at_location(location_id).await?;
    Ok(Json(accounts))
}

/// Soft-deactivate an account
async fn deactivate_account(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    ctx.account_manager
        .deactivate_account(&auth.identity, account_id)
        .await?;

    Ok(Json(json!({ "message": "Account deactivated" })))
}
