/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Access/refresh token issue and validation
/// - [`middleware`]: Bearer header parsing and the per-request [`middleware::AuthContext`]
/// - [`authorization`]: Company owner/admin/member checks
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::auth::password::{hash_password, verify_password};
/// use quizdesk_shared::auth::jwt::issue_pair;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password1")?;
/// assert!(verify_password("user_password1", &hash)?);
///
/// let tokens = issue_pair(Uuid::new_v4(), "a-secret-key-that-is-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
