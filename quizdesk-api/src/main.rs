//! # QuizDesk API Server
//!
//! Multi-tenant quiz platform: users join companies, companies publish
//! quizzes, members take them and results roll up into ratings.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/quizdesk \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p quizdesk-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON logs and `RUST_LOG` to change the filter.

use anyhow::Context;
use quizdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use quizdesk_shared::{
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool,
    },
    redis::{AttemptCache, RedisClient, RedisConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "quizdesk_api=debug,quizdesk_shared=debug,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connects the attempt cache, or returns `None` to run without it
async fn connect_cache(config: &Config) -> Option<AttemptCache> {
    let url = match &config.redis.url {
        Some(url) => url,
        None => {
            tracing::info!("REDIS_URL not set, attempt detail cache disabled");
            return None;
        }
    };

    match RedisClient::new(RedisConfig::new(url.clone())).await {
        Ok(client) => Some(AttemptCache::new(client, config.redis.attempt_ttl_secs)),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, attempt detail cache disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("QuizDesk API v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;

    if !config.api.production {
        ensure_database_exists(&config.database.url)
            .await
            .context("Failed to create the database")?;
    }

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    let status = get_migration_status(&db).await?;
    tracing::info!(
        applied = status.applied_migrations,
        latest = ?status.latest_version,
        "Migrations applied"
    );

    let cache = connect_cache(&config).await;
    let bind_address = config.bind_address();

    let app = build_router(AppState::new(db.clone(), config, cache));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}
