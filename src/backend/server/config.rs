/**
 * Server Configuration
 *
 * Configuration is read from environment variables (a `.env` file is loaded
 * first when present) or assembled with `ServerConfig::builder()`.
 *
 * # Variables
 *
 * - `DATABASE_URL` - SQLite URL, default `sqlite://teamhub.db?mode=rwc`
 * - `JWT_SECRET` - HS256 signing secret, required
 * - `SERVER_PORT` - listen port, default 3000
 * - `OUTBOUND_BUFFER` - per-connection outbound queue length, default 256
 * - `ROOM_CLEANUP_SECS` - stale connection sweep interval, default 300
 */

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::auth::sessions::{JwtKeys, DEFAULT_TOKEN_TTL_SECS};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://teamhub.db?mode=rwc";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub outbound_buffer: usize,
    pub token_ttl_secs: u64,
    pub cleanup_interval: Duration,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Load configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut builder = Self::builder();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            builder = builder.jwt_secret(secret);
        }
        if let Some(port) = parse_env::<u16>("SERVER_PORT")? {
            builder = builder.port(port);
        }
        if let Some(buffer) = parse_env::<usize>("OUTBOUND_BUFFER")? {
            builder = builder.outbound_buffer(buffer);
        }
        if let Some(secs) = parse_env::<u64>("ROOM_CLEANUP_SECS")? {
            builder = builder.cleanup_interval(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn jwt_keys(&self) -> JwtKeys {
        JwtKeys::new(&self.jwt_secret).with_ttl(self.token_ttl_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    port: Option<u16>,
    outbound_buffer: Option<usize>,
    token_ttl_secs: Option<u64>,
    cleanup_interval: Option<Duration>,
}

impl ServerConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn outbound_buffer(mut self, buffer: usize) -> Self {
        self.outbound_buffer = Some(buffer);
        self
    }

    pub fn token_ttl_secs(mut self, secs: u64) -> Self {
        self.token_ttl_secs = Some(secs);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let jwt_secret = self
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingValue("JWT_SECRET"))?;

        let outbound_buffer = self.outbound_buffer.unwrap_or(DEFAULT_OUTBOUND_BUFFER);
        if outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                name: "OUTBOUND_BUFFER",
                value: "0".to_string(),
            });
        }

        Ok(ServerConfig {
            database_url: self
                .database_url
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            port: self.port.unwrap_or(DEFAULT_PORT),
            outbound_buffer,
            token_ttl_secs: self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            cleanup_interval: self.cleanup_interval.unwrap_or(DEFAULT_CLEANUP_INTERVAL),
        })
    }
}

/// Connect the SQLite pool and run migrations
pub async fn load_database(config: &ServerConfig) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}
