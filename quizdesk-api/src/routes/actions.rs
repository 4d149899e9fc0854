/// Answering invites and join requests
///
/// ```text
/// POST   /v1/actions/:action_id/accept-invite    the invited user
/// POST   /v1/actions/:action_id/accept-request   owner or admin
/// DELETE /v1/actions/:action_id                  decline: the action's user, owner or admin
/// ```
///
/// The action row is locked for the whole transition so two concurrent
/// answers to the same invite cannot both succeed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::companies::load_company,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext},
    models::action::{Action, ActionTransition},
};
use sqlx::PgConnection;
use uuid::Uuid;

/// Accept an invite addressed to the caller
///
/// # Errors
///
/// - `403`: the invite is for someone else
/// - `404`: no such action
/// - `400`: the action is not an invite
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(action_id): Path<Uuid>,
) -> ApiResult<Json<Action>> {
    let mut tx = state.db.begin().await?;

    let action = Action::lock_by_id(&mut *tx, action_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Action"))?;

    authorization::require_self(auth.user_id, action.user_id)?;

    let next = action.action_type.apply(ActionTransition::AcceptInvite)?;
    let updated = Action::set_type(&mut *tx, action.id, next)
        .await?
        .ok_or_else(|| ApiError::not_found("Action"))?;

    tx.commit().await?;

    tracing::info!(
        action_id = %action_id,
        company_id = %updated.company_id,
        user_id = %updated.user_id,
        "Invite accepted"
    );

    Ok(Json(updated))
}

/// Loads an action without locking it, to authorize before a transaction
async fn load_action(state: &AppState, action_id: Uuid) -> ApiResult<Action> {
    Action::find_by_id(&state.db, action_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Action"))
}

/// Locks the action authorized earlier; it must still belong to the same pair
async fn relock_action(conn: &mut PgConnection, seen: &Action) -> ApiResult<Action> {
    Action::lock_by_id(conn, seen.id)
        .await?
        .filter(|a| a.user_id == seen.user_id && a.company_id == seen.company_id)
        .ok_or_else(|| ApiError::not_found("Action"))
}

/// Accept a join request into the company
///
/// Authorization runs before the transaction opens; the transition is
/// checked again against the locked row.
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(action_id): Path<Uuid>,
) -> ApiResult<Json<Action>> {
    let seen = load_action(&state, action_id).await?;
    let company = load_company(&state, seen.company_id).await?;
    authorization::require_company_admin(&state.db, &company, auth.user_id).await?;

    let mut tx = state.db.begin().await?;

    let action = relock_action(&mut *tx, &seen).await?;

    let next = action.action_type.apply(ActionTransition::AcceptRequest)?;
    let updated = Action::set_type(&mut *tx, action.id, next)
        .await?
        .ok_or_else(|| ApiError::not_found("Action"))?;

    tx.commit().await?;

    tracing::info!(
        action_id = %action_id,
        company_id = %updated.company_id,
        user_id = %updated.user_id,
        by = %auth.user_id,
        "Request accepted"
    );

    Ok(Json(updated))
}

/// Decline an invite or request by deleting it
///
/// Memberships are not actions to decline; they are ended through the
/// company's remove-member and leave endpoints.
pub async fn decline_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(action_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let seen = load_action(&state, action_id).await?;

    if !auth.is(seen.user_id) {
        let company = load_company(&state, seen.company_id).await?;
        authorization::require_company_admin(&state.db, &company, auth.user_id).await?;
    }

    let mut tx = state.db.begin().await?;

    let action = relock_action(&mut *tx, &seen).await?;

    if !action.action_type.is_pending() {
        return Err(ApiError::BadRequest(format!(
            "Only invites and requests can be declined, this action is {}",
            action.action_type
        )));
    }

    Action::delete(&mut *tx, action.id).await?;
    tx.commit().await?;

    tracing::info!(
        action_id = %action_id,
        company_id = %action.company_id,
        user_id = %action.user_id,
        by = %auth.user_id,
        action_type = %action.action_type,
        "Action declined"
    );

    Ok(StatusCode::NO_CONTENT)
}
