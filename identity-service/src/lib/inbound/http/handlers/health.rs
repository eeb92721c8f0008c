use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn health(State(state): State<AppState>) -> Result<ApiSuccess<HealthData>, ApiError> {
    state.auth_service.ping().await?;

    Ok(ApiSuccess::new(StatusCode::OK, HealthData { status: "ok" }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthData {
    pub status: &'static str,
}
