/// Redis integration
///
/// Redis only holds the short-lived detail of each user's latest quiz
/// attempt. Everything durable lives in PostgreSQL, so the server runs with
/// Redis absent or down; attempt detail is then simply unavailable.
///
/// ```text
/// POST /v1/quizzes/:id/attempts
///        │
///        ├── INSERT INTO results ...            (PostgreSQL, must succeed)
///        │
///        └── SET quiz_attempt:{u}:{c}:{q} EX ttl (Redis, best-effort)
/// ```
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::redis::{AttemptCache, RedisClient, RedisConfig, DEFAULT_ATTEMPT_TTL_SECS};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let cache = AttemptCache::new(client, DEFAULT_ATTEMPT_TTL_SECS);
/// # Ok(())
/// # }
/// ```

pub mod attempt_cache;
pub mod client;

pub use attempt_cache::{
    attempt_key, AttemptCache, AttemptCacheError, AttemptDetail, DEFAULT_ATTEMPT_TTL_SECS,
};
pub use client::{RedisClient, RedisClientError, RedisConfig, RedisStats};
