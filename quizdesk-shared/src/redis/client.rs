/// Redis client wrapper
///
/// Holds a `redis::aio::ConnectionManager`, which reconnects on its own, so
/// the client can be cloned into every handler and used without checking
/// connection state first.
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    #[error("Redis command error: {0}")]
    CommandError(String),

    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    #[error("Redis health check failed: {0}")]
    HealthCheckFailed(String),
}

impl From<RedisError> for RedisClientError {
    fn from(err: RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => RedisClientError::ConnectionError(err.to_string()),
            _ => RedisClientError::CommandError(err.to_string()),
        }
    }
}

/// Redis connection settings
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://[username:password@]host:port[/db]`
    pub url: String,

    /// How long the initial connect may take
    pub connection_timeout_secs: u64,

    /// How long a single command may take
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    /// Settings for `url` with 5s connect and 2s command timeouts
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout_secs: 5,
            command_timeout_secs: 2,
        }
    }
}

/// Cloneable Redis handle
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Fails if the URL cannot be parsed or the server does not answer within
    /// `connection_timeout_secs`.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let manager = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout_secs),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| RedisClientError::ConnectionError("connect timed out".to_string()))?
        .map_err(|e| RedisClientError::ConnectionError(e.to_string()))?;

        tracing::info!(url = %sanitize_url(&config.url), "Connected to Redis");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Sends PING; `Ok(true)` on PONG
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.manager.clone();

        let result: Result<String, RedisError> = tokio::time::timeout(
            self.command_timeout(),
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| RedisClientError::HealthCheckFailed("PING timed out".to_string()))?;

        match result {
            Ok(pong) if pong == "PONG" => Ok(true),
            Ok(other) => {
                tracing::warn!(response = %other, "Unexpected PING response");
                Ok(false)
            }
            Err(e) => Err(RedisClientError::HealthCheckFailed(e.to_string())),
        }
    }

    /// A connection handle; cheap to clone
    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }

    /// Health summary for the `/health` endpoint
    pub async fn stats(&self) -> RedisStats {
        RedisStats {
            healthy: self.ping().await.unwrap_or(false),
            url: sanitize_url(&self.config.url),
        }
    }
}

/// Redis health summary
#[derive(Debug, Clone, Serialize)]
pub struct RedisStats {
    pub healthy: bool,

    /// URL with credentials masked
    pub url: String,
}

/// Masks `user:password@` in a Redis URL
fn sanitize_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
