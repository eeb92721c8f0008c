use std::env;

use config::builder::ConfigBuilder;
use config::builder::DefaultState;
use config::Config as RawConfig;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub refresh_token: RefreshTokenConfig,
    pub maintenance: MaintenanceConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Shared with every service that verifies access tokens
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshTokenConfig {
    pub expiration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// 0 disables the expired refresh token sweep
    pub sweep_interval_seconds: u64,
}

/// Per-client request budget applied to every route.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// 0 disables rate limiting
    pub requests_per_second: u32,
    pub burst_size: u32,
    /// Key clients by the first `X-Forwarded-For` address; only safe behind a proxy that sets it
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
            burst_size: 100,
            trust_forwarded_for: false,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    ///
    /// # Errors
    /// Fails when a source cannot be parsed, a required key is missing, or
    /// a value is out of range (an empty JWT secret included).
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::default().separator("__"));

        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        RawConfig::builder()
            .set_default("database.max_connections", 5)?
            .set_default("server.http_port", 8080)?
            .set_default("jwt.expiration_hours", auth::DEFAULT_ACCESS_TOKEN_TTL_HOURS)?
            .set_default(
                "refresh_token.expiration_hours",
                crate::identity::service::DEFAULT_REFRESH_TOKEN_TTL_HOURS,
            )?
            .set_default("maintenance.sweep_interval_seconds", 3600)?
            .set_default("rate_limit.requests_per_second", 100)?
            .set_default("rate_limit.burst_size", 100)?
            .set_default("rate_limit.trust_forwarded_for", false)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_hours must be positive".into(),
            ));
        }
        if self.refresh_token.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "refresh_token.expiration_hours must be positive".into(),
            ));
        }
        if self.rate_limit.requests_per_second > 0 && self.rate_limit.burst_size == 0 {
            return Err(ConfigError::Message(
                "rate_limit.burst_size must be positive when rate limiting is enabled".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be positive".into(),
            ));
        }

        Ok(())
    }
}
