/// Authentication endpoints
///
/// - `POST /v1/auth/register`: create an account and sign in
/// - `POST /v1/auth/login`: exchange email + password for tokens
/// - `POST /v1/auth/refresh`: exchange a refresh token for a new pair
/// - `GET /v1/auth/me`: the caller's profile
///
/// Tokens are HS256 JWTs; access tokens last 24 hours, refresh tokens 30 days.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::trim,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use quizdesk_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked further by `validate_password_strength`
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub lastname: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: jwt::TokenPair,
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
///
/// { "email": "ann@example.com", "password": "s3cretpass", "firstname": "Ann", "lastname": "Lee" }
/// ```
///
/// # Errors
///
/// - `422`: invalid email, empty names, weak password
/// - `409`: email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    trim(&mut req.email);
    trim(&mut req.firstname);
    trim(&mut req.lastname);
    req.validate()?;
    password::validate_password_strength(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            firstname: req.firstname,
            lastname: req.lastname,
        },
    )
    .await?;

    let tokens = jwt::issue_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

/// Log in with email and password
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    trim(&mut req.email);
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    let tokens = jwt::issue_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { user, tokens }))
}

/// Exchange a refresh token for a new token pair
///
/// Fails with 401 if the token is invalid, expired, an access token, or
/// belongs to a user that no longer exists.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<jwt::TokenPair>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    if User::find_by_id(&state.db, claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("User no longer exists".to_string()));
    }

    Ok(Json(jwt::issue_pair(claims.sub, state.jwt_secret())?))
}

/// The authenticated user's own profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(user))
}
