/// Email template endpoints
use crate::{
    auth::AuthContext,
    authz,
    context::AppContext,
    db::models::EmailTemplate,
    error::ApiResult,
    templates::CreateTemplateRequest,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Build template routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/templates", post(create_template))
        .route("/api/locations/:id/templates", get(list_templates))
}

/// Create a template at a location
async fn create_template(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<Json<EmailTemplate>> {
    authz::require_manager(&auth.identity)?;
    authz::require_location_access(&auth.identity, req.location_id)?;

    let template = ctx
        .template_manager
        .create_template(
            &req.name,
            &req.subject,
            &req.body,
            req.location_id,
            auth.identity.account_id,
        )
        .await?;

    Ok(Json(template))
}

/// List templates at a location
async fn list_templates(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Json<Vec<EmailTemplate>>> {
    authz::require_location_access(&auth.identity, location_id)?;

    let templates = ctx.template_manager.list_templates(location_id).await?;
    Ok(Json(templates))
}
