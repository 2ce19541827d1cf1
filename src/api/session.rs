/// Session endpoints: login and the password reset flow
use crate::{
    context::AppContext,
    error::ApiResult,
    session::{
        LoginRequest, LoginResponse, RequestPasswordResetRequest, ResetPasswordRequest,
    },
};
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

/// Build session routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/session/login", post(login))
        .route("/api/session/requestPasswordReset", post(request_password_reset))
        .route("/api/session/resetPassword", post(reset_password))
}

/// Login endpoint
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (account, token, expires_at) = ctx
        .session_manager
        .authenticate(&req.email, &req.password)
        .await?;

    let claims = ctx.session_manager.decode_and_verify(&token)?;

    Ok(Json(LoginResponse {
        token,
        account_id: account.id,
        role: account.role,
        location_ids: claims.locations,
        expires_at,
    }))
}

/// Request a password reset token
///
/// Always answers with the same success-shaped body; whether the email
/// matched an account must not be observable from the response.
async fn request_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> ApiResult<Json<Value>> {
    if let Some((token, account)) = ctx
        .session_manager
        .issue_password_reset_token(&req.email)
        .await?
    {
        let base_url = ctx.service_url();
        if let Err(e) = ctx
            .mailer
            .send_password_reset_email(&account.email, &token, &base_url)
            .await
        {
            // Logged only; the response shape stays identical
            tracing::warn!(account_id = %account.id, "Failed to send reset email: {}", e);
        }
    }

    Ok(Json(json!({
        "message": "If that email is registered, a reset link has been sent"
    })))
}

/// Complete a password reset with a previously issued token
async fn reset_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    ctx.session_manager
        .consume_reset_token(&req.token, &req.password)
        .await?;

    Ok(Json(json!({ "message": "Password has been reset" })))
}
