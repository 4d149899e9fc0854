/// User endpoints
///
/// ```text
/// GET    /v1/users?page&page_size
/// GET    /v1/users/:user_id
/// PUT    /v1/users/:user_id              self or superuser
/// DELETE /v1/users/:user_id              self or superuser
/// GET    /v1/users/:user_id/invites      self only
/// GET    /v1/users/:user_id/requests     self only
/// GET    /v1/users/:user_id/companies    self only
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{nullable, trim_opt, Items, Page, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext, password},
    models::{
        action::{Action, ActionType, UserAction},
        user::{UpdateUser, User},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Profile update; absent fields are kept, `null` clears nullable ones
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub firstname: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub lastname: Option<String>,

    /// New password, checked with `validate_password_strength`
    pub password: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub city: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,

    #[validate(length(max = 20, message = "At most 20 links"))]
    pub links: Option<Vec<String>>,
}

async fn load_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

/// The caller's own row, needed for the superuser flag
async fn load_caller(state: &AppState, auth: AuthContext) -> ApiResult<User> {
    User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<User>>> {
    let users = User::list(&state.db, params.page_size(), params.offset()).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(params.wrap(users, total)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(load_user(&state, user_id).await?))
}

/// Update a profile
///
/// # Errors
///
/// - `403`: caller is neither the user nor a superuser
/// - `404`: no such user
/// - `422`: invalid fields or weak password
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(mut req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let caller = load_caller(&state, auth).await?;
    authorization::require_self_or_superuser(&caller, user_id)?;

    trim_opt(&mut req.firstname);
    trim_opt(&mut req.lastname);
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(new_password) => {
            password::validate_password_strength(new_password)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        password_hash,
        firstname: req.firstname,
        lastname: req.lastname,
        avatar_url: req.avatar_url,
        status: req.status,
        city: req.city,
        phone: req.phone,
        links: req.links,
    };

    if update.is_empty() {
        return Ok(Json(load_user(&state, user_id).await?));
    }

    let user = User::update(&state.db, user_id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = %user_id, by = %auth.user_id, "User updated");

    Ok(Json(user))
}

/// Delete a user; their owned companies and results go with them
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let caller = load_caller(&state, auth).await?;
    authorization::require_self_or_superuser(&caller, user_id)?;

    if !User::delete(&state.db, user_id).await? {
        return Err(ApiError::not_found("User"));
    }

    tracing::info!(user_id = %user_id, by = %auth.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn list_own_actions(
    state: &AppState,
    auth: AuthContext,
    user_id: Uuid,
    action_type: ActionType,
) -> ApiResult<Json<Items<UserAction>>> {
    authorization::require_self(auth.user_id, user_id)?;

    let items = Action::list_for_user(&state.db, user_id, action_type).await?;
    Ok(Json(Items { items }))
}

/// Companies that invited the user
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Items<UserAction>>> {
    list_own_actions(&state, auth, user_id, ActionType::Invite).await
}

/// Companies the user asked to join
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Items<UserAction>>> {
    list_own_actions(&state, auth, user_id, ActionType::Request).await
}

/// Companies the user belongs to, with their role in each
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Items<UserAction>>> {
    authorization::require_self(auth.user_id, user_id)?;

    let items = Action::list_user_companies(&state.db, user_id).await?;
    Ok(Json(Items { items }))
}
