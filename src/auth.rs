/// Authentication extractors and utilities
use crate::{
    api::middleware::extract_bearer_token,
    authz::Identity,
    context::AppContext,
    error::ApiError,
    session::SessionClaims,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates the session from the request
///
/// The token only identifies the account; role, active flag and location
/// memberships are re-read from the store on every request, so a deactivated
/// account is rejected even while its token is still within its lifetime.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
    pub claims: SessionClaims,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

        let claims = state.session_manager.decode_and_verify(&token)?;
        let identity = state.session_manager.load_identity(claims.sub).await?;

        Ok(AuthContext { identity, claims })
    }
}
