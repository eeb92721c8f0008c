use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::models::Identity;
use crate::inbound::http::middleware::AuthenticatedIdentity;
use crate::inbound::http::router::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedIdentity>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    state
        .auth_service
        .get_identity(&authenticated.identity_id)
        .await
        .map_err(ApiError::from)
        .map(|ref identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for IdentityData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            email: identity.email.as_str().to_string(),
            created_at: identity.created_at,
        }
    }
}
