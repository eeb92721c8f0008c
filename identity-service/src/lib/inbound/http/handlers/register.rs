use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::models::Identity;
use crate::identity::models::RegisterCommand;
use crate::identity::models::TokenPair;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    state
        .auth_service
        .register(body.into_command())
        .await
        .map_err(ApiError::from)
        .map(|(identity, tokens)| {
            ApiSuccess::new(
                StatusCode::CREATED,
                RegisterResponseData::new(&identity, tokens),
            )
        })
}

/// HTTP request body for registering an identity (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
}

impl RegisterRequest {
    fn into_command(self) -> RegisterCommand {
        RegisterCommand::new(self.email, self.password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl RegisterResponseData {
    fn new(identity: &Identity, tokens: TokenPair) -> Self {
        Self {
            user_id: identity.id.to_string(),
            email: identity.email.as_str().to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        }
    }
}
