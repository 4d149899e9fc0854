/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and `.env` in
/// development).
///
/// # Environment Variables
///
/// | Variable                   | Default     | Notes                           |
/// |----------------------------|-------------|---------------------------------|
/// | `API_HOST`                 | `0.0.0.0`   |                                 |
/// | `API_PORT`                 | `8080`      |                                 |
/// | `API_PRODUCTION`           | `false`     | enables HSTS                    |
/// | `CORS_ORIGINS`             | `*`         | comma-separated                 |
/// | `DATABASE_URL`             | required    |                                 |
/// | `DATABASE_MAX_CONNECTIONS` | `10`        |                                 |
/// | `JWT_SECRET`               | required    | at least 32 characters          |
/// | `REDIS_URL`                | unset       | attempt cache disabled if unset |
/// | `ATTEMPT_CACHE_TTL_SECS`   | `172800`    | 48 hours                        |
///
/// # Example
///
/// ```no_run
/// use quizdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use quizdesk_shared::redis::DEFAULT_ATTEMPT_TTL_SECS;
use std::env;

/// Shortest accepted `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub redis: RedisSettings,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode turns on HSTS
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret. Generate with `openssl rand -hex 32`.
    pub secret: String,
}

/// Attempt cache settings
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// `None` disables the attempt cache
    pub url: Option<String>,

    pub attempt_ttl_secs: u64,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails when a required variable is missing, a number does not parse,
    /// or `JWT_SECRET` is shorter than [`MIN_JWT_SECRET_LEN`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .map(|v| v.parse::<u16>())
            .transpose()
            .context("API_PORT must be a port number")?
            .unwrap_or(8080);

        let production = var("API_PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let database_url =
            var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?
            .unwrap_or(10);

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            );
        }

        let attempt_ttl_secs = var("ATTEMPT_CACHE_TTL_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("ATTEMPT_CACHE_TTL_SECS must be a number of seconds")?
            .unwrap_or(DEFAULT_ATTEMPT_TTL_SECS);

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            redis: RedisSettings {
                url: var("REDIS_URL"),
                attempt_ttl_secs,
            },
        })
    }

    /// `host:port` to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when any origin may call the API
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/quizdesk"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.api.production);
        assert!(config.cors_allows_any());
        assert_eq!(config.database.max_connections, 10);
        assert!(config.redis.url.is_none());
        assert_eq!(config.redis.attempt_ttl_secs, 172_800);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("API_PRODUCTION", "true"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("DATABASE_URL", "postgresql://localhost/quizdesk"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("JWT_SECRET", SECRET),
            ("REDIS_URL", "redis://localhost:6379"),
            ("ATTEMPT_CACHE_TTL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert!(config.api.production);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.cors_allows_any());
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.redis.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.redis.attempt_ttl_secs, 60);
    }

    #[test]
    fn test_missing_required_vars() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/quizdesk")]).is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/quizdesk"),
            ("JWT_SECRET", "too-short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_bad_port_rejected() {
        assert!(load(&[
            ("DATABASE_URL", "postgresql://localhost/quizdesk"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .is_err());
    }
}
