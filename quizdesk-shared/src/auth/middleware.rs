/// Bearer-token authentication for Axum handlers
///
/// [`authenticate`] turns an `Authorization: Bearer <jwt>` header into an
/// [`AuthContext`]. The API server runs it in a `from_fn_with_state`
/// middleware and inserts the context into request extensions, where
/// handlers pick it up:
///
/// ```
/// use axum::Extension;
/// use quizdesk_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// True when the caller is `user_id`
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("Token expired")]
    Expired,

    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Validates the request's access token and returns the caller
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;

    Ok(AuthContext::from_jwt(claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "middleware-test-secret-with-32-bytes!";

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_authenticate_valid_access_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, TokenType::Access), SECRET).unwrap();

        let auth = authenticate(&headers(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(auth, AuthContext::from_jwt(user_id));
        assert!(auth.is(user_id));
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert!(matches!(
            authenticate(&HeaderMap::new(), SECRET),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate(&headers("Basic dXNlcjpwYXNz"), SECRET),
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            authenticate(&headers("Bearer "), SECRET),
            Err(AuthError::InvalidFormat)
        ));
    }

    #[test]
    fn test_refresh_token_is_rejected() {
        let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Refresh), SECRET).unwrap();
        assert!(matches!(
            authenticate(&headers(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let claims =
            Claims::with_expiration(Uuid::new_v4(), TokenType::Access, Duration::hours(-2));
        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(
            authenticate(&headers(&format!("Bearer {}", token)), SECRET),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
