/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use quizdesk_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config, None));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use quizdesk_shared::redis::AttemptCache;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,

    /// `None` when Redis is not configured or was unreachable at startup
    pub cache: Option<AttemptCache>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, cache: Option<AttemptCache>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            cache,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                        public
/// /v1/auth/{register,login,refresh}              public
/// /v1/auth/me                                    bearer token
/// /v1/users/...                                  bearer token
/// /v1/companies/...                              bearer token
/// /v1/actions/...                                bearer token
/// /v1/quizzes/...                                bearer token
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:user_id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/:user_id/invites", get(routes::users::list_invites))
        .route("/:user_id/requests", get(routes::users::list_requests))
        .route("/:user_id/companies", get(routes::users::list_companies))
        .route("/:user_id/rating", get(routes::ratings::user_rating))
        .route(
            "/:user_id/rating/quizzes/:quiz_id",
            get(routes::ratings::user_quiz_rating),
        )
        .route(
            "/:user_id/rating/companies/:company_id",
            get(routes::ratings::user_company_rating),
        );

    let company_routes = Router::new()
        .route(
            "/",
            get(routes::companies::list_companies).post(routes::companies::create_company),
        )
        .route(
            "/:company_id",
            get(routes::companies::get_company)
                .put(routes::companies::update_company)
                .delete(routes::companies::delete_company),
        )
        .route("/:company_id/invites", get(routes::companies::list_invites))
        .route(
            "/:company_id/invites/:user_id",
            post(routes::companies::send_invite),
        )
        .route(
            "/:company_id/requests",
            get(routes::companies::list_requests).post(routes::companies::send_request),
        )
        .route("/:company_id/members", get(routes::companies::list_members))
        .route(
            "/:company_id/members/:user_id",
            axum::routing::delete(routes::companies::remove_member),
        )
        .route("/:company_id/leave", post(routes::companies::leave_company))
        .route("/:company_id/admins", get(routes::companies::list_admins))
        .route(
            "/:company_id/admins/:user_id",
            post(routes::companies::promote_admin).delete(routes::companies::demote_admin),
        )
        .route(
            "/:company_id/quizzes",
            get(routes::quizzes::list_quizzes).post(routes::quizzes::create_quiz),
        );

    let action_routes = Router::new()
        .route(
            "/:action_id",
            axum::routing::delete(routes::actions::decline_action),
        )
        .route(
            "/:action_id/accept-invite",
            post(routes::actions::accept_invite),
        )
        .route(
            "/:action_id/accept-request",
            post(routes::actions::accept_request),
        );

    let quiz_routes = Router::new()
        .route(
            "/:quiz_id",
            get(routes::quizzes::get_quiz)
                .put(routes::quizzes::update_quiz)
                .delete(routes::quizzes::delete_quiz),
        )
        .route("/:quiz_id/questions", post(routes::quizzes::add_question))
        .route(
            "/:quiz_id/questions/:question_id",
            put(routes::quizzes::update_question).delete(routes::quizzes::delete_question),
        )
        .route("/:quiz_id/attempts", post(routes::attempts::submit_attempt))
        .route(
            "/:quiz_id/attempts/:user_id/latest",
            get(routes::attempts::latest_attempt),
        );

    // route_layer keeps unknown paths as 404 instead of 401
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .nest("/users", user_routes)
        .nest("/companies", company_routes)
        .nest("/actions", action_routes)
        .nest("/quizzes", quiz_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = public_routes.merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
