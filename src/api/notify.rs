/// Bulk notification endpoints
use crate::{
    auth::AuthContext,
    authz,
    context::AppContext,
    db::models::SentEmail,
    error::ApiResult,
    notify::{BatchResult, ResendFailedRequest, SendBulkRequest},
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Build notification routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/notify/sendBulk", post(send_bulk))
        .route("/api/notify/resendFailed", post(resend_failed))
        .route("/api/locations/:id/sentEmails", get(list_sent_emails))
}

/// Send a template to a batch of recipients
async fn send_bulk(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<SendBulkRequest>,
) -> ApiResult<Json<BatchResult>> {
    authz::require_manager(&auth.identity)?;

    let template = ctx.template_manager.get_template(req.template_id).await?;
    authz::require_location_access(&auth.identity, template.location_id)?;

    // Sends go out under the caller's own address
    let sender = ctx.account_manager.get_account(auth.identity.account_id).await?;

    let result = ctx
        .notifier
        .send_bulk(&template, &req.recipients, &sender.email)
        .await?;

    Ok(Json(result))
}

/// Retry previously failed sends
async fn resend_failed(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ResendFailedRequest>,
) -> ApiResult<Json<BatchResult>> {
    authz::require_manager(&auth.identity)?;

    // Every named record must belong to a location the caller can reach
    for record_id in &req.record_ids {
        if let Some(record) = ctx.notifier.get_record(*record_id).await? {
            authz::require_location_access(&auth.identity, record.location_id)?;
        }
    }

    let result = ctx.notifier.resend_failed(&req.record_ids).await?;
    Ok(Json(result))
}

/// List send-outcome records at a location, newest first
async fn list_sent_emails(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(location_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SentEmail>>> {
    authz::require_manager(&auth.identity)?;
    authz::require_location_access(&auth.identity, location_id)?;

    let records = ctx.notifier.list_sent_emails(location_id).await?;
    Ok(Json(records))
}
