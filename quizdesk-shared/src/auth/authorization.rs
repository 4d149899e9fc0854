/// Company-level permission checks
///
/// Permissions come from the caller's [`Action`] on a company:
///
/// | Check                          | Passes for                          |
/// |--------------------------------|-------------------------------------|
/// | [`require_company_owner`]      | `companies.owner_id`                |
/// | [`require_company_admin`]      | owner, or an `admin`/`owner` action |
/// | [`require_company_member`]     | owner, or a `member`/`admin`/`owner` action |
/// | [`require_self_or_company_admin`] | the target user, or an admin     |
///
/// Every check takes an already-loaded [`Company`] so "company not found"
/// stays a 404 at the call site and never turns into a 403 here.
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::auth::authorization::require_company_admin;
/// use quizdesk_shared::models::company::Company;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, company: Company, caller: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_company_admin(&pool, &company, caller).await?;
/// // caller may now create quizzes in this company
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    action::{Action, ActionType},
    company::Company,
    user::User,
};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Only the owner of company {0} can do this")]
    NotCompanyOwner(Uuid),

    #[error("Admin rights on company {0} are required")]
    NotCompanyAdmin(Uuid),

    #[error("Not a member of company {0}")]
    NotCompanyMember(Uuid),

    #[error("Not authorized to access this resource")]
    NotAuthorized,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// The admin-rights rule: owner of the company, or holder of an admin/owner action
pub fn has_admin_rights(company: &Company, user_id: Uuid, action: Option<ActionType>) -> bool {
    company.owner_id == user_id || action.is_some_and(|t| t.has_admin_rights())
}

/// Membership rule: owner, or holder of a member/admin/owner action
pub fn is_member(company: &Company, user_id: Uuid, action: Option<ActionType>) -> bool {
    company.owner_id == user_id || action.is_some_and(|t| t.is_member())
}

async fn action_type_of(
    pool: &PgPool,
    company: &Company,
    user_id: Uuid,
) -> Result<Option<ActionType>, sqlx::Error> {
    Ok(Action::find_for(pool, company.id, user_id)
        .await?
        .map(|a| a.action_type))
}

/// Requires the caller to be the company owner
pub fn require_company_owner(company: &Company, user_id: Uuid) -> Result<(), AuthzError> {
    if company.owner_id != user_id {
        return Err(AuthzError::NotCompanyOwner(company.id));
    }
    Ok(())
}

/// Requires admin rights on the company
pub async fn require_company_admin(
    pool: &PgPool,
    company: &Company,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if company.owner_id == user_id {
        return Ok(());
    }

    let action = action_type_of(pool, company, user_id).await?;
    if !has_admin_rights(company, user_id, action) {
        return Err(AuthzError::NotCompanyAdmin(company.id));
    }

    Ok(())
}

/// Requires membership (any of member, admin, owner)
pub async fn require_company_member(
    pool: &PgPool,
    company: &Company,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if company.owner_id == user_id {
        return Ok(());
    }

    let action = action_type_of(pool, company, user_id).await?;
    if !is_member(company, user_id, action) {
        return Err(AuthzError::NotCompanyMember(company.id));
    }

    Ok(())
}

/// Returns whether the caller has admin rights, without failing
pub async fn check_company_admin(
    pool: &PgPool,
    company: &Company,
    user_id: Uuid,
) -> Result<bool, AuthzError> {
    if company.owner_id == user_id {
        return Ok(true);
    }

    let action = action_type_of(pool, company, user_id).await?;
    Ok(has_admin_rights(company, user_id, action))
}

/// Lets a user see their own data, and company admins see their members' data
pub async fn require_self_or_company_admin(
    pool: &PgPool,
    company: &Company,
    caller_id: Uuid,
    target_user_id: Uuid,
) -> Result<(), AuthzError> {
    if caller_id == target_user_id {
        return Ok(());
    }

    require_company_admin(pool, company, caller_id).await
}

/// Requires the caller to be `user_id`
pub fn require_self(caller_id: Uuid, user_id: Uuid) -> Result<(), AuthzError> {
    if caller_id != user_id {
        return Err(AuthzError::NotAuthorized);
    }
    Ok(())
}

/// Requires the caller to be `user_id` or a superuser
pub fn require_self_or_superuser(caller: &User, user_id: Uuid) -> Result<(), AuthzError> {
    if caller.id != user_id && !caller.is_superuser {
        return Err(AuthzError::NotAuthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn company(owner_id: Uuid) -> Company {
        Company {
            id: Uuid::new_v4(),
            owner_id,
            name: "Acme".to_string(),
            description: String::new(),
            avatar_url: None,
            visible: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_has_admin_rights_without_action() {
        let owner = Uuid::new_v4();
        let c = company(owner);
        assert!(has_admin_rights(&c, owner, None));
        assert!(is_member(&c, owner, None));
    }

    #[test]
    fn test_admin_action_grants_admin_rights() {
        let c = company(Uuid::new_v4());
        let user = Uuid::new_v4();

        assert!(has_admin_rights(&c, user, Some(ActionType::Admin)));
        assert!(!has_admin_rights(&c, user, Some(ActionType::Member)));
        assert!(!has_admin_rights(&c, user, Some(ActionType::Invite)));
        assert!(!has_admin_rights(&c, user, Some(ActionType::Request)));
        assert!(!has_admin_rights(&c, user, None));
    }

    #[test]
    fn test_pending_actions_are_not_membership() {
        let c = company(Uuid::new_v4());
        let user = Uuid::new_v4();

        assert!(is_member(&c, user, Some(ActionType::Member)));
        assert!(is_member(&c, user, Some(ActionType::Admin)));
        assert!(!is_member(&c, user, Some(ActionType::Invite)));
        assert!(!is_member(&c, user, Some(ActionType::Request)));
        assert!(!is_member(&c, user, None));
    }

    #[test]
    fn test_require_company_owner() {
        let owner = Uuid::new_v4();
        let c = company(owner);

        assert!(require_company_owner(&c, owner).is_ok());
        assert!(matches!(
            require_company_owner(&c, Uuid::new_v4()),
            Err(AuthzError::NotCompanyOwner(id)) if id == c.id
        ));
    }

    #[test]
    fn test_require_self() {
        let user = Uuid::new_v4();
        assert!(require_self(user, user).is_ok());
        assert!(require_self(user, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_authz_error_display() {
        let id = Uuid::new_v4();
        assert!(AuthzError::NotCompanyAdmin(id).to_string().contains("Admin rights"));
        assert!(AuthzError::NotCompanyMember(id).to_string().contains("Not a member"));
        assert!(AuthzError::NotAuthorized.to_string().contains("Not authorized"));
    }
}
