/// Database models for QuizDesk
///
/// Each model owns its SQL. Functions that must take part in a caller's
/// transaction accept `&mut PgConnection` (pass `&mut *tx`); the rest take
/// `&PgPool`.
///
/// # Models
///
/// - `user`: User accounts and profiles
/// - `company`: Companies and their visibility
/// - `action`: A user's relationship to a company (invite, request, member, admin, owner)
/// - `quiz`: Quizzes, their questions and the question-list rules
/// - `result`: One row per quiz attempt, aggregated into ratings
///
/// # Example
///
/// ```no_run
/// use quizdesk_shared::models::company::{Company, CreateCompany};
/// use quizdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company = Company::create(&pool, owner_id, CreateCompany {
///     name: "Acme".to_string(),
///     description: None,
///     avatar_url: None,
///     visible: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod action;
pub mod company;
pub mod quiz;
pub mod result;
pub mod user;

use serde::Serialize;

/// Page metadata returned alongside every paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// 1-based page number
    pub current_page: i64,

    /// Number of pages (at least 1)
    pub total_pages: i64,

    /// Number of rows across all pages
    pub total_results: i64,
}

impl Pagination {
    /// Builds page metadata for `total_results` rows split into `page_size` pages
    pub fn new(current_page: i64, page_size: i64, total_results: i64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = ((total_results + page_size - 1) / page_size).max(1);

        Self {
            current_page,
            total_pages,
            total_results,
        }
    }

    /// SQL `OFFSET` for a 1-based page, saturating at `i64::MAX`
    pub fn offset(page: i64, page_size: i64) -> i64 {
        (page.max(1) - 1).saturating_mul(page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounds_pages_up() {
        let p = Pagination::new(1, 10, 21);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.total_results, 21);
    }

    #[test]
    fn test_pagination_empty_has_one_page() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::offset(1, 20), 0);
        assert_eq!(Pagination::offset(3, 20), 40);
        assert_eq!(Pagination::offset(0, 20), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        assert_eq!(Pagination::offset(i64::MAX, 20), i64::MAX);
        assert_eq!(Pagination::offset(i64::MAX, 1), i64::MAX - 1);
    }
}
