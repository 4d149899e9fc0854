/// Company model and database operations
///
/// A company is created by a user who becomes its owner. The owner
/// relationship is recorded twice: in `companies.owner_id` and as an
/// `owner` row in `actions`, both written in one transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     avatar_url VARCHAR(512),
///     visible BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::action::{Action, ActionType};

/// A company
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID
    pub id: Uuid,

    /// The user who created the company
    pub owner_id: Uuid,

    /// Display name
    pub name: String,

    /// Description (may be empty)
    pub description: String,

    /// Avatar URL
    pub avatar_url: Option<String>,

    /// Hidden companies are left out of the public listing
    pub visible: bool,

    /// When the company was created
    pub created_at: DateTime<Utc>,

    /// When the company was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company
#[derive(Debug, Clone)]
pub struct CreateCompany {
    /// Display name
    pub name: String,

    /// Description (defaults to empty)
    pub description: Option<String>,

    /// Avatar URL
    pub avatar_url: Option<String>,

    /// Visibility (defaults to visible)
    pub visible: Option<bool>,
}

/// Partial company update
#[derive(Debug, Clone, Default)]
pub struct UpdateCompany {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New avatar URL (`Some(None)` clears it)
    pub avatar_url: Option<Option<String>>,

    /// New visibility
    pub visible: Option<bool>,
}

impl Company {
    /// Creates a company and the owner's `owner` action in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if `owner_id` does not reference a user or the
    /// database fails; nothing is written in that case.
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: CreateCompany,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (owner_id, name, description, avatar_url, visible)
            VALUES ($1, $2, COALESCE($3, ''), $4, COALESCE($5, TRUE))
            RETURNING id, owner_id, name, description, avatar_url, visible, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.avatar_url)
        .bind(data.visible)
        .fetch_one(&mut *tx)
        .await?;

        Action::create(&mut *tx, owner_id, company.id, ActionType::Owner).await?;

        tx.commit().await?;

        Ok(company)
    }

    /// Finds a company by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, owner_id, name, description, avatar_url, visible, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists visible companies, newest first
    pub async fn list_visible(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, owner_id, name, description, avatar_url, visible, created_at, updated_at
            FROM companies
            WHERE visible = TRUE
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts visible companies
    pub async fn count_visible(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM companies WHERE visible = TRUE")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Applies a partial update
    ///
    /// Returns `None` when the company does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCompany,
    ) -> Result<Option<Self>, sqlx::Error> {
        let clear_or_set_avatar = data.avatar_url.is_some();

        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                avatar_url = CASE WHEN $4 THEN $5 ELSE avatar_url END,
                visible = COALESCE($6, visible),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, description, avatar_url, visible, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(clear_or_set_avatar)
        .bind(data.avatar_url.flatten())
        .bind(data.visible)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a company; actions, quizzes, questions and results cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
