/// Action model: a user's relationship to a company
///
/// There is at most one action per (user, company). Its type moves through a
/// small state machine:
///
/// ```text
///            accept-invite
///   invite ───────────────┐
///                         ▼        promote
///                       member ───────────► admin
///                         ▲    ◄───────────
///   request ──────────────┘       demote
///            accept-request
/// ```
///
/// `owner` is only ever written when a company is created. Declining an
/// invite or request, removing a member and leaving a company all delete the
/// row rather than transition it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE action_type AS ENUM ('invite', 'request', 'member', 'admin', 'owner');
///
/// CREATE TABLE actions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     action_type action_type NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT actions_user_company_key UNIQUE (user_id, company_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Kind of relationship a user has with a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "action_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// The owner invited the user; waiting for the user
    Invite,

    /// The user asked to join; waiting for the owner or an admin
    Request,

    /// Regular member
    Member,

    /// Member with admin rights
    Admin,

    /// Company creator
    Owner,
}

/// Operations that change an existing action's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTransition {
    /// The invited user accepts
    AcceptInvite,

    /// The owner or an admin accepts a join request
    AcceptRequest,

    /// The owner makes a member an admin
    Promote,

    /// The owner takes admin rights away
    Demote,
}

/// An illegal state-machine step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{transition} is not allowed for an action of type {from}")]
    Illegal {
        from: ActionType,
        transition: ActionTransition,
    },
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Invite => "invite",
            ActionType::Request => "request",
            ActionType::Member => "member",
            ActionType::Admin => "admin",
            ActionType::Owner => "owner",
        }
    }

    /// Invite or request that nobody has answered yet
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionType::Invite | ActionType::Request)
    }

    /// Member, admin or owner
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            ActionType::Member | ActionType::Admin | ActionType::Owner
        )
    }

    /// Admin or owner
    pub fn has_admin_rights(&self) -> bool {
        matches!(self, ActionType::Admin | ActionType::Owner)
    }

    /// Returns the type after applying `transition`
    ///
    /// # Errors
    ///
    /// [`TransitionError::Illegal`] when the transition does not start from
    /// this type, e.g. accepting an invite that is already a membership.
    pub fn apply(self, transition: ActionTransition) -> Result<ActionType, TransitionError> {
        match (self, transition) {
            (ActionType::Invite, ActionTransition::AcceptInvite) => Ok(ActionType::Member),
            (ActionType::Request, ActionTransition::AcceptRequest) => Ok(ActionType::Member),
            (ActionType::Member, ActionTransition::Promote) => Ok(ActionType::Admin),
            (ActionType::Admin, ActionTransition::Demote) => Ok(ActionType::Member),
            (from, transition) => Err(TransitionError::Illegal { from, transition }),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ActionTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionTransition::AcceptInvite => "accept invite",
            ActionTransition::AcceptRequest => "accept request",
            ActionTransition::Promote => "promote",
            ActionTransition::Demote => "demote",
        };
        f.write_str(s)
    }
}

/// A (user, company) relationship row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Action {
    /// Unique action ID
    pub id: Uuid,

    /// The user side of the relationship
    pub user_id: Uuid,

    /// The company side of the relationship
    pub company_id: Uuid,

    /// Current type
    pub action_type: ActionType,

    /// When the row was first written
    pub created_at: DateTime<Utc>,

    /// When the type last changed
    pub updated_at: DateTime<Utc>,
}

/// An action seen from the user's side, joined with its company
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserAction {
    pub action_id: Uuid,
    pub action_type: ActionType,
    pub company_id: Uuid,
    pub company_name: String,
    pub company_avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An action seen from the company's side, joined with its user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyAction {
    pub action_id: Uuid,
    pub action_type: ActionType,
    pub user_id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Action {
    /// Inserts a new action
    ///
    /// Takes a connection so it can join the caller's transaction.
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `actions_user_company_key` when the
    /// pair already has an action.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: Uuid,
        company_id: Uuid,
        action_type: ActionType,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            INSERT INTO actions (user_id, company_id, action_type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, company_id, action_type, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(action_type)
        .fetch_one(conn)
        .await
    }

    /// Finds an action by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT id, user_id, company_id, action_type, created_at, updated_at
            FROM actions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds an action by ID and row-locks it until the transaction ends
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT id, user_id, company_id, action_type, created_at, updated_at
            FROM actions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Finds the action for a (company, user) pair
    pub async fn find_for(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT id, user_id, company_id, action_type, created_at, updated_at
            FROM actions
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds and row-locks the action for a (company, user) pair
    pub async fn lock_for(
        conn: &mut PgConnection,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            SELECT id, user_id, company_id, action_type, created_at, updated_at
            FROM actions
            WHERE company_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }

    /// Overwrites the action's type
    pub async fn set_type(
        conn: &mut PgConnection,
        id: Uuid,
        action_type: ActionType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Action>(
            r#"
            UPDATE actions
            SET action_type = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, company_id, action_type, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(action_type)
        .fetch_optional(conn)
        .await
    }

    /// Deletes an action
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM actions WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's actions of one type, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        action_type: ActionType,
    ) -> Result<Vec<UserAction>, sqlx::Error> {
        sqlx::query_as::<_, UserAction>(
            r#"
            SELECT a.id AS action_id, a.action_type, a.company_id,
                   c.name AS company_name, c.avatar_url AS company_avatar_url,
                   a.created_at
            FROM actions a
            JOIN companies c ON c.id = a.company_id
            WHERE a.user_id = $1 AND a.action_type = $2
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(action_type)
        .fetch_all(pool)
        .await
    }

    /// Lists the companies a user belongs to (member, admin or owner)
    pub async fn list_user_companies(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<UserAction>, sqlx::Error> {
        sqlx::query_as::<_, UserAction>(
            r#"
            SELECT a.id AS action_id, a.action_type, a.company_id,
                   c.name AS company_name, c.avatar_url AS company_avatar_url,
                   a.created_at
            FROM actions a
            JOIN companies c ON c.id = a.company_id
            WHERE a.user_id = $1 AND a.action_type IN ('member', 'admin', 'owner')
            ORDER BY c.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists a company's actions of one type, oldest first
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        action_type: ActionType,
    ) -> Result<Vec<CompanyAction>, sqlx::Error> {
        sqlx::query_as::<_, CompanyAction>(
            r#"
            SELECT a.id AS action_id, a.action_type, a.user_id,
                   u.email::TEXT AS email, u.firstname, u.lastname, u.avatar_url,
                   a.created_at
            FROM actions a
            JOIN users u ON u.id = a.user_id
            WHERE a.company_id = $1 AND a.action_type = $2
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(action_type)
        .fetch_all(pool)
        .await
    }

    /// Lists everyone in a company (member, admin or owner)
    pub async fn list_company_members(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<Vec<CompanyAction>, sqlx::Error> {
        sqlx::query_as::<_, CompanyAction>(
            r#"
            SELECT a.id AS action_id, a.action_type, a.user_id,
                   u.email::TEXT AS email, u.firstname, u.lastname, u.avatar_url,
                   a.created_at
            FROM actions a
            JOIN users u ON u.id = a.user_id
            WHERE a.company_id = $1 AND a.action_type IN ('member', 'admin', 'owner')
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_invite_makes_member() {
        assert_eq!(
            ActionType::Invite.apply(ActionTransition::AcceptInvite),
            Ok(ActionType::Member)
        );
    }

    #[test]
    fn test_accept_request_makes_member() {
        assert_eq!(
            ActionType::Request.apply(ActionTransition::AcceptRequest),
            Ok(ActionType::Member)
        );
    }

    #[test]
    fn test_promote_and_demote() {
        assert_eq!(
            ActionType::Member.apply(ActionTransition::Promote),
            Ok(ActionType::Admin)
        );
        assert_eq!(
            ActionType::Admin.apply(ActionTransition::Demote),
            Ok(ActionType::Member)
        );
    }

    #[test]
    fn test_illegal_transitions() {
        // An invite cannot be accepted as a request and vice versa
        assert!(ActionType::Invite
            .apply(ActionTransition::AcceptRequest)
            .is_err());
        assert!(ActionType::Request
            .apply(ActionTransition::AcceptInvite)
            .is_err());

        assert!(ActionType::Member
            .apply(ActionTransition::AcceptInvite)
            .is_err());
        assert!(ActionType::Invite.apply(ActionTransition::Promote).is_err());
        assert!(ActionType::Admin.apply(ActionTransition::Promote).is_err());
        assert!(ActionType::Member.apply(ActionTransition::Demote).is_err());

        // Nothing moves the owner
        for t in [
            ActionTransition::AcceptInvite,
            ActionTransition::AcceptRequest,
            ActionTransition::Promote,
            ActionTransition::Demote,
        ] {
            assert_eq!(
                ActionType::Owner.apply(t),
                Err(TransitionError::Illegal {
                    from: ActionType::Owner,
                    transition: t
                })
            );
        }
    }

    #[test]
    fn test_transition_error_message() {
        let err = ActionType::Member
            .apply(ActionTransition::AcceptInvite)
            .unwrap_err();
        assert_eq!(err.to_string(), "accept invite is not allowed for an action of type member");
    }

    #[test]
    fn test_type_predicates() {
        assert!(ActionType::Invite.is_pending());
        assert!(ActionType::Request.is_pending());
        assert!(!ActionType::Member.is_pending());

        assert!(!ActionType::Request.is_member());
        assert!(ActionType::Member.is_member());
        assert!(ActionType::Owner.is_member());

        assert!(!ActionType::Member.has_admin_rights());
        assert!(ActionType::Admin.has_admin_rights());
        assert!(ActionType::Owner.has_admin_rights());
    }

    #[test]
    fn test_action_type_serde() {
        assert_eq!(
            serde_json::to_string(&ActionType::Invite).unwrap(),
            "\"invite\""
        );
        let parsed: ActionType = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, ActionType::Admin);
    }
}
