use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use auth::RemoteVerifier;
use axum::body::Body;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::Request;
use axum::middleware;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::MakeRequestUuid;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::request_id::SetRequestIdLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::me::me;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::ApiError;
use super::handlers::INTERNAL_ERROR_MESSAGE;
use super::middleware::authenticate as auth_middleware;
use super::rate_limit::rate_limit;
use super::rate_limit::ClientRateLimiter;
use crate::config::RateLimitConfig;
use crate::identity::ports::AuthServicePort;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub verifier: RemoteVerifier,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    verifier: RemoteVerifier,
    rate_limit_config: &RateLimitConfig,
) -> Router {
    let state = AppState {
        auth_service,
        verifier,
    };

    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let routes = Router::new().merge(public_routes).merge(protected_routes);

    let routes = match ClientRateLimiter::from_config(rate_limit_config) {
        Some(limiter) => routes.layer(middleware::from_fn_with_state(
            Arc::new(limiter),
            rate_limit,
        )),
        None => {
            tracing::warn!("Rate limiting disabled");
            routes
        }
    };

    with_http_layers(routes).with_state(state)
}

/// Outer stack shared by every route, outermost first: panic recovery,
/// request ids, tracing, security headers, CORS.
fn with_http_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // Headers stay out of the span: they carry bearer tokens
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(trace_layer)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            ))
            // Token responses must not be cached
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(CorsLayer::permissive()),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Handler panicked");

    ApiError::InternalServerError(INTERNAL_ERROR_MESSAGE.to_string()).into_response()
}
