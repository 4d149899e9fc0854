/// Quiz attempt results
///
/// One row is written per attempt. Ratings are computed on read by summing
/// rows for a user, optionally narrowed to one quiz or one company; see
/// [`crate::scoring::rate`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE results (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     quiz_id UUID REFERENCES quizzes(id) ON DELETE SET NULL,
///     right_answers INTEGER NOT NULL,
///     answers INTEGER NOT NULL,
///     passed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A stored attempt
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,

    /// NULL once the quiz has been deleted
    pub quiz_id: Option<Uuid>,

    pub right_answers: i32,
    pub answers: i32,
    pub passed_at: DateTime<Utc>,
}

/// Sums over a set of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ResultTotals {
    /// Sum of `right_answers`
    pub right_answers: i64,

    /// Sum of `answers`
    pub answers: i64,

    /// Number of attempts
    pub attempts: i64,
}

impl QuizResult {
    /// Records an attempt
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        company_id: Uuid,
        quiz_id: Uuid,
        right_answers: i32,
        answers: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, QuizResult>(
            r#"
            INSERT INTO results (user_id, company_id, quiz_id, right_answers, answers)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, company_id, quiz_id, right_answers, answers, passed_at
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(quiz_id)
        .bind(right_answers)
        .bind(answers)
        .fetch_one(pool)
        .await
    }

    /// Totals over every attempt by a user
    pub async fn totals_for_user(pool: &PgPool, user_id: Uuid) -> Result<ResultTotals, sqlx::Error> {
        sqlx::query_as::<_, ResultTotals>(
            r#"
            SELECT COALESCE(SUM(right_answers), 0)::BIGINT AS right_answers,
                   COALESCE(SUM(answers), 0)::BIGINT AS answers,
                   COUNT(*) AS attempts
            FROM results
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Totals over a user's attempts at one quiz
    pub async fn totals_for_user_quiz(
        pool: &PgPool,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<ResultTotals, sqlx::Error> {
        sqlx::query_as::<_, ResultTotals>(
            r#"
            SELECT COALESCE(SUM(right_answers), 0)::BIGINT AS right_answers,
                   COALESCE(SUM(answers), 0)::BIGINT AS answers,
                   COUNT(*) AS attempts
            FROM results
            WHERE user_id = $1 AND quiz_id = $2
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(pool)
        .await
    }

    /// Totals over a user's attempts at any quiz of one company
    pub async fn totals_for_user_company(
        pool: &PgPool,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<ResultTotals, sqlx::Error> {
        sqlx::query_as::<_, ResultTotals>(
            r#"
            SELECT COALESCE(SUM(right_answers), 0)::BIGINT AS right_answers,
                   COALESCE(SUM(answers), 0)::BIGINT AS answers,
                   COUNT(*) AS attempts
            FROM results
            WHERE user_id = $1 AND company_id = $2
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_one(pool)
        .await
    }
}
