/// User model and database operations
///
/// Users sign up with email + password, edit their own profile and join
/// companies through [`Action`](super::action::Action) rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     firstname VARCHAR(255) NOT NULL,
///     lastname VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(512),
///     status VARCHAR(255),
///     city VARCHAR(255),
///     phone VARCHAR(32),
///     links TEXT[] NOT NULL DEFAULT '{}',
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     firstname: "Ada".to_string(),
///     lastname: "Lovelace".to_string(),
/// }).await?;
///
/// let found = User::find_by_email(&pool, "ADA@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, firstname, lastname, avatar_url, status, \
     city, phone, links, is_superuser, created_at, updated_at, last_login_at";

/// A user account
///
/// The password is stored as an Argon2id hash and never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (case-insensitive, unique)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// First name
    pub firstname: String,

    /// Last name
    pub lastname: String,

    /// Avatar URL
    pub avatar_url: Option<String>,

    /// Free-form status line
    pub status: Option<String>,

    /// City
    pub city: Option<String>,

    /// Phone number
    pub phone: Option<String>,

    /// Profile links
    pub links: Vec<String>,

    /// Superusers may edit and delete any account
    pub is_superuser: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for signing a user up
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// First name
    pub firstname: String,

    /// Last name
    pub lastname: String,
}

/// Partial profile update
///
/// Only `Some` fields are written. Nullable columns use `Option<Option<_>>`
/// so that `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New password hash
    pub password_hash: Option<String>,

    /// New first name
    pub firstname: Option<String>,

    /// New last name
    pub lastname: Option<String>,

    /// New avatar URL
    pub avatar_url: Option<Option<String>>,

    /// New status line
    pub status: Option<Option<String>>,

    /// New city
    pub city: Option<Option<String>>,

    /// New phone number
    pub phone: Option<Option<String>>,

    /// Replacement list of profile links
    pub links: Option<Vec<String>>,
}

impl UpdateUser {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none()
            && self.firstname.is_none()
            && self.lastname.is_none()
            && self.avatar_url.is_none()
            && self.status.is_none()
            && self.city.is_none()
            && self.phone.is_none()
            && self.links.is_none()
    }

    /// Renders the `SET` list, numbering placeholders from `$2` (`$1` is the id)
    fn set_clause(&self) -> String {
        let mut clause = String::from("updated_at = NOW()");
        let mut bind = 1;

        let mut push = |column: &str| {
            bind += 1;
            clause.push_str(&format!(", {} = ${}", column, bind));
        };

        if self.password_hash.is_some() {
            push("password_hash");
        }
        if self.firstname.is_some() {
            push("firstname");
        }
        if self.lastname.is_some() {
            push("lastname");
        }
        if self.avatar_url.is_some() {
            push("avatar_url");
        }
        if self.status.is_some() {
            push("status");
        }
        if self.city.is_some() {
            push("city");
        }
        if self.phone.is_some() {
            push("phone");
        }
        if self.links.is_some() {
            push("links");
        }

        clause
    }
}

impl User {
    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, firstname, lastname)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.firstname)
            .bind(data.lastname)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update
    ///
    /// Returns `None` when the user does not exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use quizdesk_shared::models::user::{User, UpdateUser};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// let update = UpdateUser {
    ///     city: Some(Some("Kyiv".to_string())),
    ///     phone: Some(None),
    ///     ..Default::default()
    /// };
    /// User::update(&pool, user_id, update).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {}",
            data.set_clause(),
            USER_COLUMNS
        );

        // Bind order must match set_clause()
        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(firstname) = data.firstname {
            q = q.bind(firstname);
        }
        if let Some(lastname) = data.lastname {
            q = q.bind(lastname);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(city) = data.city {
            q = q.bind(city);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(links) = data.links {
            q = q.bind(links);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user; their actions, owned companies and results cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps `last_login_at`
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.is_empty());
        assert_eq!(update.set_clause(), "updated_at = NOW()");
    }

    #[test]
    fn test_set_clause_numbers_placeholders_in_bind_order() {
        let update = UpdateUser {
            firstname: Some("Grace".to_string()),
            city: Some(None),
            links: Some(vec!["https://example.com".to_string()]),
            ..Default::default()
        };

        assert!(!update.is_empty());
        assert_eq!(
            update.set_clause(),
            "updated_at = NOW(), firstname = $2, city = $3, links = $4"
        );
    }
}
