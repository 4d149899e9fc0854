/// API route handlers, one module per resource
///
/// - `health`: liveness and dependency status
/// - `auth`: register, login, refresh, current user
/// - `users`: profiles and a user's invites, requests and companies
/// - `companies`: company CRUD, invites, requests, members, admins
/// - `actions`: accepting and declining invites and requests
/// - `quizzes`: quiz and question management
/// - `attempts`: taking quizzes and reviewing the latest attempt
/// - `ratings`: aggregated scores

pub mod actions;
pub mod attempts;
pub mod auth;
pub mod companies;
pub mod health;
pub mod quizzes;
pub mod ratings;
pub mod users;

use quizdesk_shared::models::Pagination;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&page_size=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    /// 1-based page, at least 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        Pagination::offset(self.page(), self.page_size())
    }

    /// Wraps one page of rows with its metadata
    pub fn wrap<T: Serialize>(&self, items: Vec<T>, total_results: i64) -> Page<T> {
        Page {
            items,
            pagination: Pagination::new(self.page(), self.page_size(), total_results),
        }
    }
}

/// A paginated listing
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// An unpaginated listing
#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub items: Vec<T>,
}

/// Strips surrounding whitespace so length rules see the stored value
pub(crate) fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_opt(value: &mut Option<String>) {
    if let Some(value) = value {
        trim(value);
    }
}

/// Deserializes a field where `null` means "clear" and absence means "keep"
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>` field.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
