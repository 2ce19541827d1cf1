/// Location endpoints
use crate::{
    auth::AuthContext,
    authz,
    context::AppContext,
    db::models::Location,
    error::ApiResult,
    location::CreateLocationRequest,
};
use axum::{extract::State, routing::get, Json, Router};

/// Build location routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route("/api/locations/mine", get(my_locations))
}

/// List all locations (developer only)
async fn list_locations(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Location>>> {
    authz::require_developer(&auth.identity)?;
    Ok(Json(ctx.location_manager.list_locations().await?))
}

/// List the caller's accessible locations
async fn my_locations(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Location>>> {
    Ok(Json(ctx.location_manager.list_for_identity(&auth.identity).await?))
}

/// Create a location (developer only)
async fn create_location(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateLocationRequest>,
) -> ApiResult<Json<Location>> {
    authz::require_developer(&auth.identity)?;

    let location = ctx
        .location_manager
        .create_location(&req.name, auth.identity.account_id)
        .await?;

    Ok(Json(location))
}
