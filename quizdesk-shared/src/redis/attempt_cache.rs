/// Ephemeral per-question detail of the latest quiz attempt
///
/// After a result row is stored, the per-question outcome is written to
/// Redis so the user (or a company admin) can review what was answered.
/// Only the latest attempt is kept and it expires after the configured TTL.
///
/// ```text
/// SET quiz_attempt:{user_id}:{company_id}:{quiz_id} <json> EX <ttl>
/// ```
///
/// The cache is best-effort: callers log and drop write failures, and a
/// missing key reads as "no detail available".

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::redis::client::{RedisClient, RedisClientError};
use crate::scoring::QuestionOutcome;

/// Default expiry: 48 hours
pub const DEFAULT_ATTEMPT_TTL_SECS: u64 = 48 * 60 * 60;

/// Attempt cache errors
#[derive(Error, Debug)]
pub enum AttemptCacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisClientError),

    #[error("Redis command error: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Redis command timed out")]
    Timeout,

    #[error("Invalid cached attempt: {0}")]
    Json(#[from] serde_json::Error),
}

/// What is cached for one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub quiz_id: Uuid,
    pub result_id: Uuid,
    pub right_answers: i32,
    pub answers: i32,
    pub passed_at: DateTime<Utc>,
    pub questions: Vec<QuestionOutcome>,
}

impl AttemptDetail {
    pub fn key(&self) -> String {
        attempt_key(self.user_id, self.company_id, self.quiz_id)
    }
}

/// Redis key for a (user, company, quiz) attempt
pub fn attempt_key(user_id: Uuid, company_id: Uuid, quiz_id: Uuid) -> String {
    format!("quiz_attempt:{}:{}:{}", user_id, company_id, quiz_id)
}

/// Stores and loads [`AttemptDetail`]s
#[derive(Clone)]
pub struct AttemptCache {
    client: RedisClient,
    ttl_seconds: u64,
}

impl AttemptCache {
    pub fn new(client: RedisClient, ttl_seconds: u64) -> Self {
        Self {
            client,
            ttl_seconds,
        }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    /// Writes the detail, replacing any earlier attempt and resetting the TTL
    pub async fn store(&self, detail: &AttemptDetail) -> Result<(), AttemptCacheError> {
        let key = detail.key();
        let value = serde_json::to_string(detail)?;
        let mut conn = self.client.get_connection();

        let _: () = tokio::time::timeout(
            self.client.command_timeout(),
            conn.set_ex(&key, value, self.ttl_seconds),
        )
        .await
        .map_err(|_| AttemptCacheError::Timeout)??;

        tracing::debug!(key = %key, ttl = self.ttl_seconds, "Cached attempt detail");

        Ok(())
    }

    /// Loads the latest attempt detail, `None` if missing or expired
    pub async fn fetch(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Option<AttemptDetail>, AttemptCacheError> {
        let key = attempt_key(user_id, company_id, quiz_id);
        let mut conn = self.client.get_connection();

        let value: Option<String> =
            tokio::time::timeout(self.client.command_timeout(), conn.get(&key))
                .await
                .map_err(|_| AttemptCacheError::Timeout)??;

        value
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(AttemptCacheError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::client::RedisConfig;

    fn detail() -> AttemptDetail {
        AttemptDetail {
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            result_id: Uuid::new_v4(),
            right_answers: 1,
            answers: 2,
            passed_at: Utc::now(),
            questions: vec![
                QuestionOutcome {
                    question_id: Uuid::new_v4(),
                    selected: Some(0),
                    correct: true,
                },
                QuestionOutcome {
                    question_id: Uuid::new_v4(),
                    selected: None,
                    correct: false,
                },
            ],
        }
    }

    #[test]
    fn test_attempt_key_format() {
        let user = Uuid::nil();
        let company = Uuid::from_u128(1);
        let quiz = Uuid::from_u128(2);

        assert_eq!(
            attempt_key(user, company, quiz),
            format!("quiz_attempt:{}:{}:{}", user, company, quiz)
        );
    }

    #[test]
    fn test_default_ttl_is_48_hours() {
        assert_eq!(DEFAULT_ATTEMPT_TTL_SECS, 172_800);
    }

    #[test]
    fn test_detail_json_shape() {
        let d = detail();
        let json = serde_json::to_value(&d).unwrap();

        assert_eq!(json["right_answers"], 1);
        assert_eq!(json["questions"][1]["selected"], serde_json::Value::Null);
        assert_eq!(json["questions"][0]["correct"], true);
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_store_and_fetch() {
        let client = RedisClient::new(RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        let cache = AttemptCache::new(client, 60);
        let d = detail();

        cache.store(&d).await.unwrap();
        let loaded = cache
            .fetch(d.user_id, d.company_id, d.quiz_id)
            .await
            .unwrap();
        assert_eq!(loaded, Some(d.clone()));

        let mut conn = cache.client().get_connection();
        let ttl: i64 = conn.ttl(d.key()).await.unwrap();
        assert!(ttl > 0 && ttl <= 60);

        let missing = cache
            .fetch(d.user_id, d.company_id, Uuid::new_v4())
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
