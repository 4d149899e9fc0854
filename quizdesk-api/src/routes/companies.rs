/// Company endpoints
///
/// ```text
/// GET|POST       /v1/companies
/// GET|PUT|DELETE /v1/companies/:company_id              PUT/DELETE: owner
/// GET            /v1/companies/:company_id/invites       admin rights
/// POST           /v1/companies/:company_id/invites/:uid  owner
/// GET            /v1/companies/:company_id/requests      admin rights
/// POST           /v1/companies/:company_id/requests      the caller asks to join
/// GET            /v1/companies/:company_id/members
/// DELETE         /v1/companies/:company_id/members/:uid  admin rights
/// POST           /v1/companies/:company_id/leave         member or admin
/// GET            /v1/companies/:company_id/admins
/// POST|DELETE    /v1/companies/:company_id/admins/:uid   owner
/// ```
///
/// Hidden companies answer 404 to anyone outside them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{nullable, trim, trim_opt, Items, Page, PageParams},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext},
    models::{
        action::{Action, ActionTransition, ActionType, CompanyAction},
        company::{Company, CreateCompany, UpdateCompany},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar_url: Option<String>,

    pub visible: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// `null` removes the avatar
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar_url: Option<Option<String>>,

    pub visible: Option<bool>,
}

/// Loads a company or answers 404
pub(crate) async fn load_company(state: &AppState, company_id: Uuid) -> ApiResult<Company> {
    Company::find_by_id(&state.db, company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))
}

/// Loads a company the caller may see: visible, or the caller belongs to it
pub(crate) async fn load_visible_company(
    state: &AppState,
    auth: AuthContext,
    company_id: Uuid,
) -> ApiResult<Company> {
    let company = load_company(state, company_id).await?;

    if !company.visible
        && authorization::require_company_member(&state.db, &company, auth.user_id)
            .await
            .is_err()
    {
        return Err(ApiError::not_found("Company"));
    }

    Ok(company)
}

pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Company>>> {
    let companies = Company::list_visible(&state.db, params.page_size(), params.offset()).await?;
    let total = Company::count_visible(&state.db).await?;

    Ok(Json(params.wrap(companies, total)))
}

/// Create a company; the caller becomes its owner
pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(mut req): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    trim(&mut req.name);
    req.validate()?;

    let company = Company::create(
        &state.db,
        auth.user_id,
        CreateCompany {
            name: req.name,
            description: req.description,
            avatar_url: req.avatar_url,
            visible: req.visible,
        },
    )
    .await?;

    tracing::info!(company_id = %company.id, owner_id = %auth.user_id, "Company created");

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Company>> {
    Ok(Json(load_visible_company(&state, auth, company_id).await?))
}

pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(mut req): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    let company = load_company(&state, company_id).await?;
    authorization::require_company_owner(&company, auth.user_id)?;

    trim_opt(&mut req.name);
    req.validate()?;

    let updated = Company::update(
        &state.db,
        company_id,
        UpdateCompany {
            name: req.name,
            description: req.description,
            avatar_url: req.avatar_url,
            visible: req.visible,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Company"))?;

    tracing::info!(company_id = %company_id, "Company updated");

    Ok(Json(updated))
}

/// Delete a company with its actions, quizzes, questions and results
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let company = load_company(&state, company_id).await?;
    authorization::require_company_owner(&company, auth.user_id)?;

    Company::delete(&state.db, company_id).await?;

    tracing::info!(company_id = %company_id, "Company deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn list_pending(
    state: &AppState,
    auth: AuthContext,
    company_id: Uuid,
    action_type: ActionType,
) -> ApiResult<Json<Items<CompanyAction>>> {
    let company = load_company(state, company_id).await?;
    authorization::require_company_admin(&state.db, &company, auth.user_id).await?;

    let items = Action::list_for_company(&state.db, company_id, action_type).await?;
    Ok(Json(Items { items }))
}

/// Outstanding invites sent by the company
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Items<CompanyAction>>> {
    list_pending(&state, auth, company_id, ActionType::Invite).await
}

/// Outstanding requests to join the company
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Items<CompanyAction>>> {
    list_pending(&state, auth, company_id, ActionType::Request).await
}

/// Invite a user into the company
///
/// # Errors
///
/// - `403`: caller is not the owner
/// - `404`: no such company or user
/// - `409`: the user already has an action in this company
pub async fn send_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<(StatusCode, Json<Action>)> {
    let company = load_company(&state, company_id).await?;
    authorization::require_company_owner(&company, auth.user_id)?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let mut conn = state.db.acquire().await?;
    let action = Action::create(&mut *conn, user_id, company_id, ActionType::Invite).await?;

    tracing::info!(
        action_id = %action.id,
        company_id = %company_id,
        user_id = %user_id,
        "Invite sent"
    );

    Ok((StatusCode::CREATED, Json(action)))
}

/// Ask to join the company
pub async fn send_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Action>)> {
    load_visible_company(&state, auth, company_id).await?;

    let mut conn = state.db.acquire().await?;
    let action = Action::create(&mut *conn, auth.user_id, company_id, ActionType::Request).await?;

    tracing::info!(
        action_id = %action.id,
        company_id = %company_id,
        user_id = %auth.user_id,
        "Join request sent"
    );

    Ok((StatusCode::CREATED, Json(action)))
}

/// Everyone in the company: members, admins and the owner
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Items<CompanyAction>>> {
    load_visible_company(&state, auth, company_id).await?;

    let items = Action::list_company_members(&state.db, company_id).await?;
    Ok(Json(Items { items }))
}

pub async fn list_admins(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Items<CompanyAction>>> {
    load_visible_company(&state, auth, company_id).await?;

    let items = Action::list_for_company(&state.db, company_id, ActionType::Admin).await?;
    Ok(Json(Items { items }))
}

/// Remove a member or admin from the company
///
/// Admins may remove members; only the owner may remove an admin. The
/// owner's own row is never removed.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let company = load_company(&state, company_id).await?;
    authorization::require_company_admin(&state.db, &company, auth.user_id).await?;

    let mut tx = state.db.begin().await?;

    let action = Action::lock_for(&mut *tx, company_id, user_id)
        .await?
        .filter(|a| a.action_type.is_member())
        .ok_or_else(|| ApiError::not_found("Member"))?;

    match action.action_type {
        ActionType::Owner => {
            return Err(ApiError::Forbidden(
                "The company owner cannot be removed".to_string(),
            ))
        }
        ActionType::Admin => authorization::require_company_owner(&company, auth.user_id)?,
        _ => {}
    }

    Action::delete(&mut *tx, action.id).await?;
    tx.commit().await?;

    tracing::info!(
        action_id = %action.id,
        company_id = %company_id,
        user_id = %user_id,
        by = %auth.user_id,
        "Member removed"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Leave a company the caller is a member or admin of
pub async fn leave_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_company(&state, company_id).await?;

    let mut tx = state.db.begin().await?;

    let action = Action::lock_for(&mut *tx, company_id, auth.user_id)
        .await?
        .filter(|a| a.action_type.is_member())
        .ok_or_else(|| ApiError::NotFound("Not a member of this company".to_string()))?;

    if action.action_type == ActionType::Owner {
        return Err(ApiError::BadRequest(
            "The owner cannot leave; delete the company instead".to_string(),
        ));
    }

    Action::delete(&mut *tx, action.id).await?;
    tx.commit().await?;

    tracing::info!(company_id = %company_id, user_id = %auth.user_id, "Member left company");

    Ok(StatusCode::NO_CONTENT)
}

async fn change_role(
    state: &AppState,
    auth: AuthContext,
    company_id: Uuid,
    user_id: Uuid,
    transition: ActionTransition,
) -> ApiResult<Json<Action>> {
    let company = load_company(state, company_id).await?;
    authorization::require_company_owner(&company, auth.user_id)?;

    let mut tx = state.db.begin().await?;

    let action = Action::lock_for(&mut *tx, company_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member"))?;

    let next = action.action_type.apply(transition)?;

    let updated = Action::set_type(&mut *tx, action.id, next)
        .await?
        .ok_or_else(|| ApiError::not_found("Member"))?;

    tx.commit().await?;

    tracing::info!(
        action_id = %updated.id,
        company_id = %company_id,
        user_id = %user_id,
        from = %action.action_type,
        to = %updated.action_type,
        "Role changed"
    );

    Ok(Json(updated))
}

/// Promote a member to admin
pub async fn promote_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Action>> {
    change_role(&state, auth, company_id, user_id, ActionTransition::Promote).await
}

/// Demote an admin back to member
pub async fn demote_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Action>> {
    change_role(&state, auth, company_id, user_id, ActionTransition::Demote).await
}
