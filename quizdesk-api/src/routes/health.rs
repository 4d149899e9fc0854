/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "redis": "disabled"
/// }
/// ```
///
/// The database is required: `status` is `degraded` when it does not answer.
/// Redis only backs the attempt-detail cache, so its state is reported but
/// never degrades the service.

use crate::app::AppState;
use axum::{extract::State, Json};
use quizdesk_shared::db::pool;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,

    /// `connected`, `disconnected` or `disabled`
    pub redis: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = pool::health_check(&state.db).await.is_ok();

    let redis = match &state.cache {
        None => "disabled",
        Some(cache) if cache.client().stats().await.healthy => "connected",
        Some(_) => "disconnected",
    };

    if !database_ok {
        tracing::warn!("Health check: database unreachable");
    }

    Json(HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        redis: redis.to_string(),
    })
}
