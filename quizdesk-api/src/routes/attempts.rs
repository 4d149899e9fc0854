/// Taking quizzes
///
/// ```text
/// POST /v1/quizzes/:quiz_id/attempts                 member, admin or owner
/// GET  /v1/quizzes/:quiz_id/attempts/:user_id/latest  the user, or an admin
/// ```
///
/// Submitting an attempt stores one result row and then caches the
/// per-question outcome in Redis. The cache write is best-effort: a failure
/// is logged and the attempt still succeeds.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{companies::load_company, quizzes::load_quiz},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext},
    models::{quiz::Question, result::QuizResult},
    redis::AttemptDetail,
    scoring::{self, QuestionOutcome},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Submitted answers
///
/// ```json
/// { "answers": { "<question_id>": 1, "<question_id>": 0 } }
/// ```
///
/// Questions left out count as wrong; unknown question ids are ignored.
#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    #[serde(default)]
    pub answers: HashMap<Uuid, i32>,
}

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub result: QuizResult,

    /// right_answers / answers for this attempt, 2 decimals
    pub rate: Option<f64>,

    pub questions: Vec<QuestionOutcome>,
}

/// Take a quiz
///
/// # Errors
///
/// - `403`: caller is not in the quiz's company
/// - `404`: no such quiz
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<AttemptRequest>,
) -> ApiResult<(StatusCode, Json<AttemptResponse>)> {
    let quiz = load_quiz(&state, quiz_id).await?;
    let company = load_company(&state, quiz.company_id).await?;
    authorization::require_company_member(&state.db, &company, auth.user_id).await?;

    let questions = Question::list_for_quiz(&state.db, quiz_id).await?;
    let grade = scoring::grade(&questions, &req.answers);

    let result = QuizResult::create(
        &state.db,
        auth.user_id,
        company.id,
        quiz_id,
        grade.right_answers,
        grade.answers,
    )
    .await?;

    tracing::info!(
        quiz_id = %quiz_id,
        company_id = %company.id,
        user_id = %auth.user_id,
        right_answers = grade.right_answers,
        answers = grade.answers,
        "Quiz attempt recorded"
    );

    if let Some(cache) = &state.cache {
        let detail = AttemptDetail {
            user_id: auth.user_id,
            company_id: company.id,
            quiz_id,
            result_id: result.id,
            right_answers: grade.right_answers,
            answers: grade.answers,
            passed_at: result.passed_at,
            questions: grade.outcomes.clone(),
        };

        if let Err(e) = cache.store(&detail).await {
            tracing::warn!(
                error = %e,
                quiz_id = %quiz_id,
                user_id = %auth.user_id,
                "Failed to cache attempt detail"
            );
        }
    }

    let rate = scoring::rate(grade.right_answers.into(), grade.answers.into());

    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            result,
            rate,
            questions: grade.outcomes,
        }),
    ))
}

/// Per-question detail of a user's latest attempt
///
/// # Errors
///
/// - `403`: caller is neither the user nor an admin of the company
/// - `404`: no attempt cached, or it expired
/// - `503`: the attempt cache is disabled or unreachable
pub async fn latest_attempt(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((quiz_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<AttemptDetail>> {
    let quiz = load_quiz(&state, quiz_id).await?;
    let company = load_company(&state, quiz.company_id).await?;
    authorization::require_self_or_company_admin(&state.db, &company, auth.user_id, user_id)
        .await?;

    let cache = state.cache.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Attempt detail is not enabled".to_string())
    })?;

    let detail = cache
        .fetch(user_id, company.id, quiz_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No recent attempt for this quiz".to_string()))?;

    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_request_parsing() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let body = format!(r#"{{"answers": {{"{}": 1, "{}": 0}}}}"#, first, second);

        let req: AttemptRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.answers.get(&first), Some(&1));
        assert_eq!(req.answers.get(&second), Some(&0));
    }

    #[test]
    fn test_empty_attempt_allowed() {
        let req: AttemptRequest = serde_json::from_str("{}").unwrap();
        assert!(req.answers.is_empty());
    }
}
