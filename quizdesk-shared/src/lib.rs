//! # QuizDesk Shared Library
//!
//! Types, persistence and business rules shared by the QuizDesk API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, companies, actions, quizzes, results)
//! - `auth`: Password hashing, JWT, auth context and company authorization
//! - `scoring`: Quiz grading and rating aggregation
//! - `redis`: Redis client and the ephemeral attempt-detail cache

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod scoring;

/// Current version of the QuizDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
