/// Quiz and question models
///
/// A quiz belongs to a company and always has at least [`MIN_QUESTIONS`]
/// questions. Every question has at least [`MIN_ANSWERS`] answers and a
/// `correct_answer` index into them.
///
/// The rules live in pure functions ([`NewQuestion::validate`],
/// [`validate_question_list`], [`ensure_can_remove_question`]) so handlers can
/// check them before touching the database. The table CHECK constraints back
/// the per-question rules; the question-count rule is enforced by locking
/// the quiz row ([`Quiz::lock_by_id`]) before counting.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE quizzes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     name VARCHAR(255) NOT NULL,
///     title VARCHAR(255),
///     description TEXT,
///     frequency_days INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE questions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     quiz_id UUID NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     answers TEXT[] NOT NULL,
///     correct_answer INTEGER NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use quizdesk_shared::models::quiz::{validate_question_list, NewQuestion, QuizRuleError};
///
/// let one = vec![NewQuestion {
///     text: "2 + 2?".to_string(),
///     answers: vec!["3".to_string(), "4".to_string()],
///     correct_answer: 1,
/// }];
///
/// assert_eq!(
///     validate_question_list(&one),
///     Err(QuizRuleError::TooFewQuestions { count: 1 })
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

/// A quiz must keep at least this many questions
pub const MIN_QUESTIONS: usize = 2;

/// A question must offer at least this many answers
pub const MIN_ANSWERS: usize = 2;

/// Violations of the quiz/question rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizRuleError {
    #[error("a quiz needs at least {} questions, got {count}", MIN_QUESTIONS)]
    TooFewQuestions { count: usize },

    #[error("a question needs at least {} answers, got {count}", MIN_ANSWERS)]
    TooFewAnswers { count: usize },

    #[error("correct answer index {index} is out of range for {answers} answers")]
    CorrectAnswerOutOfRange { index: i32, answers: usize },

    #[error("a quiz must keep at least {} questions", MIN_QUESTIONS)]
    CannotRemoveQuestion,
}

/// A quiz row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Quiz {
    /// Unique quiz ID
    pub id: Uuid,

    /// Owning company
    pub company_id: Uuid,

    /// Author (cleared if their account is deleted)
    pub created_by: Option<Uuid>,

    /// Short name
    pub name: String,

    /// Display title
    pub title: Option<String>,

    /// Description
    pub description: Option<String>,

    /// Suggested days between attempts (informational)
    pub frequency_days: i32,

    /// When the quiz was created
    pub created_at: DateTime<Utc>,

    /// When the quiz was last updated
    pub updated_at: DateTime<Utc>,
}

/// A question row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub text: String,
    pub answers: Vec<String>,
    pub correct_answer: i32,
    pub created_at: DateTime<Utc>,
}

/// A question that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    /// Question text
    pub text: String,

    /// Answer options
    pub answers: Vec<String>,

    /// Index into `answers`
    pub correct_answer: i32,
}

impl NewQuestion {
    /// Checks the answer count and the correct-answer index
    pub fn validate(&self) -> Result<(), QuizRuleError> {
        if self.answers.len() < MIN_ANSWERS {
            return Err(QuizRuleError::TooFewAnswers {
                count: self.answers.len(),
            });
        }

        let in_range = usize::try_from(self.correct_answer)
            .map(|i| i < self.answers.len())
            .unwrap_or(false);

        if !in_range {
            return Err(QuizRuleError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                answers: self.answers.len(),
            });
        }

        Ok(())
    }
}

/// Partial question update; unset fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub answers: Option<Vec<String>>,
    pub correct_answer: Option<i32>,
}

impl Question {
    /// Merges `patch` over this question
    ///
    /// The result still has to pass [`NewQuestion::validate`]: replacing the
    /// answers can leave the old index out of range.
    pub fn merged(&self, patch: QuestionPatch) -> NewQuestion {
        NewQuestion {
            text: patch.text.unwrap_or_else(|| self.text.clone()),
            answers: patch.answers.unwrap_or_else(|| self.answers.clone()),
            correct_answer: patch.correct_answer.unwrap_or(self.correct_answer),
        }
    }
}

/// Validates the question list of a new quiz
pub fn validate_question_list(questions: &[NewQuestion]) -> Result<(), QuizRuleError> {
    if questions.len() < MIN_QUESTIONS {
        return Err(QuizRuleError::TooFewQuestions {
            count: questions.len(),
        });
    }

    questions.iter().try_for_each(NewQuestion::validate)
}

/// Checks that a quiz with `current_count` questions can lose one
pub fn ensure_can_remove_question(current_count: i64) -> Result<(), QuizRuleError> {
    if current_count <= MIN_QUESTIONS as i64 {
        return Err(QuizRuleError::CannotRemoveQuestion);
    }
    Ok(())
}

/// Quiz header fields for creation
#[derive(Debug, Clone)]
pub struct CreateQuiz {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency_days: i32,
}

/// Partial quiz header update
#[derive(Debug, Clone, Default)]
pub struct UpdateQuiz {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency_days: Option<i32>,
}

impl Quiz {
    /// Inserts a quiz and all of its questions in one transaction
    ///
    /// Callers validate the list with [`validate_question_list`] first.
    pub async fn create_with_questions(
        pool: &PgPool,
        company_id: Uuid,
        created_by: Uuid,
        data: CreateQuiz,
        questions: &[NewQuestion],
    ) -> Result<(Self, Vec<Question>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (company_id, created_by, name, title, description, frequency_days)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, created_by, name, title, description, frequency_days,
                      created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(created_by)
        .bind(data.name)
        .bind(data.title)
        .bind(data.description)
        .bind(data.frequency_days)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(questions.len());
        for question in questions {
            stored.push(Question::create(&mut *tx, quiz.id, question).await?);
        }

        tx.commit().await?;

        Ok((quiz, stored))
    }

    /// Finds a quiz by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, company_id, created_by, name, title, description, frequency_days,
                   created_at, updated_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a quiz and row-locks it until the transaction ends
    ///
    /// Serializes question additions and removals on the same quiz.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, company_id, created_by, name, title, description, frequency_days,
                   created_at, updated_at
            FROM quizzes
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Lists a company's quizzes, oldest first
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, company_id, created_by, name, title, description, frequency_days,
                   created_at, updated_at
            FROM quizzes
            WHERE company_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts a company's quizzes
    pub async fn count_for_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quizzes WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Applies a partial header update
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateQuiz,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes
            SET name = COALESCE($2, name),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                frequency_days = COALESCE($5, frequency_days),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, created_by, name, title, description, frequency_days,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.title)
        .bind(data.description)
        .bind(data.frequency_days)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a quiz and its questions; results keep a NULL `quiz_id`
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Question {
    /// Inserts a question into a quiz
    pub async fn create(
        conn: &mut PgConnection,
        quiz_id: Uuid,
        question: &NewQuestion,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (quiz_id, text, answers, correct_answer)
            VALUES ($1, $2, $3, $4)
            RETURNING id, quiz_id, text, answers, correct_answer, created_at
            "#,
        )
        .bind(quiz_id)
        .bind(&question.text)
        .bind(&question.answers)
        .bind(question.correct_answer)
        .fetch_one(conn)
        .await
    }

    /// Lists a quiz's questions in insertion order
    pub async fn list_for_quiz(pool: &PgPool, quiz_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, answers, correct_answer, created_at
            FROM questions
            WHERE quiz_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a question that belongs to `quiz_id`
    pub async fn find_in_quiz(
        conn: &mut PgConnection,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, answers, correct_answer, created_at
            FROM questions
            WHERE id = $1 AND quiz_id = $2
            "#,
        )
        .bind(question_id)
        .bind(quiz_id)
        .fetch_optional(conn)
        .await
    }

    /// Counts a quiz's questions
    pub async fn count_for_quiz(conn: &mut PgConnection, quiz_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }

    /// Overwrites a question with already-merged values
    pub async fn replace(
        conn: &mut PgConnection,
        id: Uuid,
        question: &NewQuestion,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET text = $2, answers = $3, correct_answer = $4
            WHERE id = $1
            RETURNING id, quiz_id, text, answers, correct_answer, created_at
            "#,
        )
        .bind(id)
        .bind(&question.text)
        .bind(&question.answers)
        .bind(question.correct_answer)
        .fetch_optional(conn)
        .await
    }

    /// Deletes a question
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
