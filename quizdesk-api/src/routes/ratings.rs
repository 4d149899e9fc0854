/// Rating endpoints
///
/// ```text
/// GET /v1/users/:user_id/rating                            any user
/// GET /v1/users/:user_id/rating/quizzes/:quiz_id           the user, or an admin
/// GET /v1/users/:user_id/rating/companies/:company_id      the user, or an admin
/// ```
///
/// `rate` is SUM(right_answers) / SUM(answers) over the matching results,
/// rounded to 2 decimals, and `null` when there are no attempts.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{companies::load_company, quizzes::load_quiz},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext},
    models::{
        result::{QuizResult, ResultTotals},
        user::User,
    },
    scoring,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResponse {
    pub user_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<Uuid>,

    pub rate: Option<f64>,
    pub right_answers: i64,
    pub answers: i64,
    pub attempts: i64,
}

impl RatingResponse {
    fn new(user_id: Uuid, totals: ResultTotals) -> Self {
        Self {
            user_id,
            company_id: None,
            quiz_id: None,
            rate: scoring::rate(totals.right_answers, totals.answers),
            right_answers: totals.right_answers,
            answers: totals.answers,
            attempts: totals.attempts,
        }
    }
}

/// Global rating of a user across every company
pub async fn user_rating(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<RatingResponse>> {
    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let totals = QuizResult::totals_for_user(&state.db, user_id).await?;

    Ok(Json(RatingResponse::new(user_id, totals)))
}

/// A user's rating on one quiz
pub async fn user_quiz_rating(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((user_id, quiz_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RatingResponse>> {
    let quiz = load_quiz(&state, quiz_id).await?;
    let company = load_company(&state, quiz.company_id).await?;
    authorization::require_self_or_company_admin(&state.db, &company, auth.user_id, user_id)
        .await?;

    let totals = QuizResult::totals_for_user_quiz(&state.db, user_id, quiz_id).await?;

    Ok(Json(RatingResponse {
        company_id: Some(company.id),
        quiz_id: Some(quiz_id),
        ..RatingResponse::new(user_id, totals)
    }))
}

/// A user's rating across one company's quizzes
pub async fn user_company_rating(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((user_id, company_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RatingResponse>> {
    let company = load_company(&state, company_id).await?;
    authorization::require_self_or_company_admin(&state.db, &company, auth.user_id, user_id)
        .await?;

    let totals = QuizResult::totals_for_user_company(&state.db, user_id, company_id).await?;

    Ok(Json(RatingResponse {
        company_id: Some(company_id),
        ..RatingResponse::new(user_id, totals)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_from_two_attempts() {
        // 3/5 then 4/5 on the same quiz
        let totals = ResultTotals {
            right_answers: 7,
            answers: 10,
            attempts: 2,
        };
        let rating = RatingResponse::new(Uuid::nil(), totals);

        assert_eq!(rating.rate, Some(0.7));
        assert_eq!(rating.attempts, 2);
    }

    #[test]
    fn test_rating_without_attempts_is_null() {
        let rating = RatingResponse::new(Uuid::nil(), ResultTotals::default());
        let json = serde_json::to_value(&rating).unwrap();

        assert_eq!(json["rate"], serde_json::Value::Null);
        assert_eq!(json["attempts"], 0);
        assert!(json.get("quiz_id").is_none());
    }
}
