/// Quiz and question endpoints
///
/// ```text
/// GET|POST       /v1/companies/:company_id/quizzes           POST: admin rights
/// GET|PUT|DELETE /v1/quizzes/:quiz_id                        PUT/DELETE: admin rights
/// POST           /v1/quizzes/:quiz_id/questions              admin rights
/// PUT|DELETE     /v1/quizzes/:quiz_id/questions/:question_id admin rights
/// ```
///
/// A quiz never has fewer than two questions: creation checks the list, and
/// deletion counts the remaining questions under a lock on the quiz row.
/// Correct answers are only shown to users with admin rights on the company.
/// Quizzes of a hidden company answer 404 to anyone outside it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        companies::{load_company, load_visible_company},
        trim, trim_opt, Page, PageParams,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use quizdesk_shared::{
    auth::{authorization, middleware::AuthContext},
    models::{
        company::Company,
        quiz::{
            validate_question_list, ensure_can_remove_question, CreateQuiz, NewQuestion,
            Question, QuestionPatch, Quiz, UpdateQuiz,
        },
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    /// How often members should retake the quiz, in days
    #[serde(default)]
    #[validate(range(min = 0, message = "Frequency must not be negative"))]
    pub frequency_days: i32,

    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Frequency must not be negative"))]
    pub frequency_days: Option<i32>,
}

/// A question as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub answers: Vec<String>,

    /// Only present for users with admin rights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i32>,
}

impl QuestionView {
    pub fn new(question: Question, reveal_answer: bool) -> Self {
        Self {
            id: question.id,
            text: question.text,
            answers: question.answers,
            correct_answer: reveal_answer.then_some(question.correct_answer),
        }
    }
}

/// A quiz with its questions
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,

    pub questions: Vec<QuestionView>,
}

impl QuizDetail {
    fn new(quiz: Quiz, questions: Vec<Question>, reveal_answers: bool) -> Self {
        Self {
            quiz,
            questions: questions
                .into_iter()
                .map(|q| QuestionView::new(q, reveal_answers))
                .collect(),
        }
    }
}

/// Loads a quiz or answers 404
pub(crate) async fn load_quiz(state: &AppState, quiz_id: Uuid) -> ApiResult<Quiz> {
    Quiz::find_by_id(&state.db, quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))
}

/// Loads a quiz and its company, requiring admin rights on the company
async fn load_quiz_as_admin(
    state: &AppState,
    auth: AuthContext,
    quiz_id: Uuid,
) -> ApiResult<(Quiz, Company)> {
    let quiz = load_quiz(state, quiz_id).await?;
    let company = load_company(state, quiz.company_id).await?;
    authorization::require_company_admin(&state.db, &company, auth.user_id).await?;

    Ok((quiz, company))
}

pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Quiz>>> {
    load_visible_company(&state, auth, company_id).await?;

    let quizzes =
        Quiz::list_for_company(&state.db, company_id, params.page_size(), params.offset()).await?;
    let total = Quiz::count_for_company(&state.db, company_id).await?;

    Ok(Json(params.wrap(quizzes, total)))
}

/// Create a quiz with its questions
///
/// # Errors
///
/// - `400`: fewer than two questions, a question with fewer than two
///   answers, or a correct-answer index out of range
/// - `403`: no admin rights on the company
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(mut req): Json<CreateQuizRequest>,
) -> ApiResult<(StatusCode, Json<QuizDetail>)> {
    let company = load_company(&state, company_id).await?;
    authorization::require_company_admin(&state.db, &company, auth.user_id).await?;

    trim(&mut req.name);
    req.validate()?;
    validate_question_list(&req.questions)?;

    let (quiz, questions) = Quiz::create_with_questions(
        &state.db,
        company_id,
        auth.user_id,
        CreateQuiz {
            name: req.name,
            title: req.title,
            description: req.description,
            frequency_days: req.frequency_days,
        },
        &req.questions,
    )
    .await?;

    tracing::info!(
        quiz_id = %quiz.id,
        company_id = %company_id,
        questions = questions.len(),
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(QuizDetail::new(quiz, questions, true))))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<Json<QuizDetail>> {
    let quiz = load_quiz(&state, quiz_id).await?;
    let company = load_visible_company(&state, auth, quiz.company_id).await?;

    let reveal = authorization::check_company_admin(&state.db, &company, auth.user_id).await?;
    let questions = Question::list_for_quiz(&state.db, quiz_id).await?;

    Ok(Json(QuizDetail::new(quiz, questions, reveal)))
}

pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
    Json(mut req): Json<UpdateQuizRequest>,
) -> ApiResult<Json<Quiz>> {
    load_quiz_as_admin(&state, auth, quiz_id).await?;
    trim_opt(&mut req.name);
    req.validate()?;

    let quiz = Quiz::update(
        &state.db,
        quiz_id,
        UpdateQuiz {
            name: req.name,
            title: req.title,
            description: req.description,
            frequency_days: req.frequency_days,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Quiz"))?;

    tracing::info!(quiz_id = %quiz_id, "Quiz updated");

    Ok(Json(quiz))
}

/// Delete a quiz and its questions; results already recorded are kept
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_quiz_as_admin(&state, auth, quiz_id).await?;

    Quiz::delete(&state.db, quiz_id).await?;

    tracing::info!(quiz_id = %quiz_id, "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<NewQuestion>,
) -> ApiResult<(StatusCode, Json<QuestionView>)> {
    load_quiz_as_admin(&state, auth, quiz_id).await?;
    req.validate()?;

    let mut tx = state.db.begin().await?;

    Quiz::lock_by_id(&mut *tx, quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    let question = Question::create(&mut *tx, quiz_id, &req).await?;
    tx.commit().await?;

    tracing::info!(quiz_id = %quiz_id, question_id = %question.id, "Question added");

    Ok((StatusCode::CREATED, Json(QuestionView::new(question, true))))
}

/// Partially update a question
///
/// The merged question must still have two answers and an in-range
/// correct-answer index.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((quiz_id, question_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<QuestionPatch>,
) -> ApiResult<Json<QuestionView>> {
    load_quiz_as_admin(&state, auth, quiz_id).await?;

    let mut tx = state.db.begin().await?;

    let current = Question::find_in_quiz(&mut *tx, quiz_id, question_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    let merged = current.merged(patch);
    merged.validate()?;

    let question = Question::replace(&mut *tx, question_id, &merged)
        .await?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    tx.commit().await?;

    tracing::info!(quiz_id = %quiz_id, question_id = %question_id, "Question updated");

    Ok(Json(QuestionView::new(question, true)))
}

/// Delete a question, keeping at least two in the quiz
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((quiz_id, question_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    load_quiz_as_admin(&state, auth, quiz_id).await?;

    let mut tx = state.db.begin().await?;

    Quiz::lock_by_id(&mut *tx, quiz_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quiz"))?;

    Question::find_in_quiz(&mut *tx, quiz_id, question_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Question"))?;

    let remaining = Question::count_for_quiz(&mut *tx, quiz_id).await?;
    ensure_can_remove_question(remaining)?;

    Question::delete(&mut *tx, question_id).await?;
    tx.commit().await?;

    tracing::info!(
        quiz_id = %quiz_id,
        question_id = %question_id,
        remaining = remaining - 1,
        "Question deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
