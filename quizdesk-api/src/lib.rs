//! # QuizDesk API Server Library
//!
//! The HTTP surface of QuizDesk: configuration, the Axum router, request
//! handlers and the mapping from domain errors to HTTP responses.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: `ApiError` and HTTP response mapping
//! - `middleware`: Bearer-token authentication and security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
