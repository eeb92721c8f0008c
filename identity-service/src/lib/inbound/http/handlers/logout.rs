use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::inbound::http::router::AppState;

/// Ends the session behind a refresh token. Unknown tokens still yield 204.
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    state.auth_service.logout(&body.refresh_token).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    refresh_token: String,
}
