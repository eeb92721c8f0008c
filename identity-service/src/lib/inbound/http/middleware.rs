use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use super::handlers::INVALID_TOKEN_MESSAGE;
use crate::identity::models::IdentityId;
use crate::inbound::http::router::AppState;

/// Extension type holding the identity proven by the request's access token.
///
/// Valid for the current request only.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    pub identity_id: IdentityId,
}

/// Middleware that verifies bearer access tokens locally and adds the subject to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let subject = state.verifier.verify_bearer(authorization).map_err(|e| {
        tracing::warn!(error = %e, "Access token rejected");
        ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    let identity_id = IdentityId::from_string(&subject).map_err(|e| {
        tracing::warn!(error = %e, "Access token subject is not an identity id");
        ApiError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
    })?;

    req.extensions_mut()
        .insert(AuthenticatedIdentity { identity_id });

    Ok(next.run(req).await)
}
