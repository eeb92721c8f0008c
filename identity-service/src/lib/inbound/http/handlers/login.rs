use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::identity::models::LoginCommand;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    state
        .auth_service
        .login(LoginCommand::new(body.email, body.password))
        .await
        .map_err(ApiError::from)
        .map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}
