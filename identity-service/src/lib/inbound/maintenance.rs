use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::identity::ports::AuthServicePort;

/// Start the periodic removal of expired refresh tokens.
///
/// Returns `None` when `interval` is zero. Abort the handle to stop the sweep.
/// Expired tokens are already rejected on use; this only reclaims storage.
pub fn spawn_refresh_token_sweep(
    auth_service: Arc<dyn AuthServicePort>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        tracing::info!("Expired refresh token sweep disabled");
        return None;
    }

    tracing::info!(
        interval_seconds = interval.as_secs(),
        "Expired refresh token sweep scheduled"
    );

    Some(tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // First tick fires immediately
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;

            if let Err(e) = auth_service.sweep_expired_refresh_tokens().await {
                tracing::warn!(error = %e, "Expired refresh token sweep failed");
            }
        }
    }))
}
