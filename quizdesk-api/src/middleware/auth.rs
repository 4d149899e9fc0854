/// Bearer-token authentication
///
/// Applied to every `/v1` route except `/v1/auth/*`. On success the caller's
/// [`AuthContext`] is stored in the request extensions, where handlers pick
/// it up with `Extension<AuthContext>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use quizdesk_shared::auth::middleware::{authenticate, AuthContext};

use crate::{app::AppState, error::ApiError};

/// Rejects the request with 401 unless it carries a valid access token
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate(req.headers(), state.jwt_secret()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
