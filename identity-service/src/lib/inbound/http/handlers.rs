use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::identity::errors::AuthError;
use crate::identity::models::TokenPair;

pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    ServiceUnavailable(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    TooManyRequests(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";
const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) | AuthError::WeakCredential(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::EmailConflict => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidRefresh => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::IdentityNotFound => ApiError::NotFound(err.to_string()),
            AuthError::Unavailable(detail) => {
                tracing::error!(error = %detail, "Backing store unavailable");
                ApiError::ServiceUnavailable(UNAVAILABLE_MESSAGE.to_string())
            }
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ApiError::InternalServerError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Token pair as returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPairData {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokenPairData {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        }
    }
}
