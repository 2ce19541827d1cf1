/// Custom button endpoints
use crate::{
    auth::AuthContext,
    authz,
    buttons::{CreateButtonRequest, SetButtonPermissionsRequest},
    context::AppContext,
    db::models::CustomButton,
    error::ApiResult,
};
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// Build button routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/buttons", post(create_button))
        .route("/api/buttons/:id/permissions", put(set_permissions))
        .route("/api/locations/:id/buttons", get(list_buttons))
}

/// Create a button at a location
async fn create_button(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateButtonRequest>,
) -> ApiResult<Json<CustomButton>> {
    authz::require_manager(&auth.identity)?;
    authz::require_location_access(&auth.identity, req.location_id)?;

    let button = ctx
        .button_manager
        .create_button(&req.name, &req.url, req.location_id, auth.identity.account_id)
        .await?;

    Ok(Json(button))
}

/// List buttons visible to the caller at a location
async fn list_buttons(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CustomButton>>> {
    authz::require_location_access(&auth.identity, location_id)?;

    let buttons = ctx
        .button_manager
        .list_visible_buttons(&auth.identity, location_id)
        .await?;

    Ok(Json(buttons))
}

/// Replace a button's permission set
async fn set_permissions(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(button_id): Path<Uuid>,
    Json(req): Json<SetButtonPermissionsRequest>,
) -> ApiResult<Json<Value>> {
    authz::require_manager(&auth.identity)?;

    let button = ctx.button_manager.get_button(button_id).await?;
    authz::require_location_access(&auth.identity, button.location_id)?;

    ctx.button_manager
        .set_permissions(button_id, &req.permissions)
        .await?;

    Ok(Json(json!({ "message": "Permissions updated" })))
}
