use std::net::IpAddr;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use governor::DefaultKeyedRateLimiter;
use governor::Quota;
use governor::RateLimiter;

use super::handlers::ApiError;
use crate::config::RateLimitConfig;

/// Client keys kept before idle buckets are pruned.
const MAX_TRACKED_CLIENTS: usize = 10_000;
const FORWARDED_FOR: &str = "x-forwarded-for";
const RATE_LIMITED_MESSAGE: &str = "Too many requests";

/// Token bucket per client address.
///
/// Clients are keyed by peer address, or by the first `X-Forwarded-For` entry
/// when that header is trusted. Requests with neither share one bucket.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    trust_forwarded_for: bool,
}

impl ClientRateLimiter {
    /// Build a limiter, or `None` when `requests_per_second` is 0.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        let per_second = NonZeroU32::new(config.requests_per_second)?;
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(per_second);

        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_second(per_second).allow_burst(burst)),
            trust_forwarded_for: config.trust_forwarded_for,
        })
    }

    fn client_ip(&self, req: &Request) -> IpAddr {
        if self.trust_forwarded_for {
            let forwarded = req
                .headers()
                .get(FORWARDED_FOR)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

            if let Some(ip) = forwarded {
                return ip;
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::from([0, 0, 0, 0]))
    }

    fn check(&self, client_ip: IpAddr) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }

        self.limiter.check_key(&client_ip).is_ok()
    }
}

/// Middleware rejecting clients that exhausted their budget with 429
pub async fn rate_limit(
    State(limiter): State<Arc<ClientRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_ip = limiter.client_ip(&req);

    if !limiter.check(client_ip) {
        tracing::warn!(client_ip = %client_ip, "Rate limit exceeded");
        return Err(ApiError::TooManyRequests(RATE_LIMITED_MESSAGE.to_string()));
    }

    Ok(next.run(req).await)
}
