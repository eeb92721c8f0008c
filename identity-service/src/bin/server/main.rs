use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::identity::ports::AuthServicePort;
use identity_service::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::maintenance::spawn_refresh_token_sweep;
use identity_service::repositories::PostgresCredentialStore;
use identity_service::repositories::PostgresRefreshTokenStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_token_ttl_hours = config.jwt.expiration_hours,
        refresh_token_ttl_hours = config.refresh_token.expiration_hours,
        sweep_interval_seconds = config.maintenance.sweep_interval_seconds,
        rate_limit_per_second = config.rate_limit.requests_per_second,
        rate_limit_burst = config.rate_limit.burst_size,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        chrono::Duration::hours(config.jwt.expiration_hours),
    ));
    let verifier = authenticator.verifier();
    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool.clone()));
    let refresh_token_store = Arc::new(PostgresRefreshTokenStore::new(pg_pool));

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        credential_store,
        refresh_token_store,
        authenticator,
        chrono::Duration::hours(config.refresh_token.expiration_hours),
    ));

    let sweep = spawn_refresh_token_sweep(
        Arc::clone(&auth_service),
        Duration::from_secs(config.maintenance.sweep_interval_seconds),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, verifier, &config.rate_limit);

    let result = axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(sweep) = sweep {
        sweep.abort();
    }

    match result {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(ref e) => tracing::error!(error = %e, "Server error"),
    };

    Ok(result?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
