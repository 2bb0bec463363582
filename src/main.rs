//! Judgeboard - Application Entry Point
//!
//! Starts the contest scoring and ranking API server.

use std::net::SocketAddr;
use std::sync::Arc;

use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use judgeboard::{
    cache::RedisCache,
    config::CONFIG,
    db::{self, PgStore},
    formats::FormatRegistry,
    handlers,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting judgeboard server...");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;
    db::test_connection(&db_pool).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    let formats = FormatRegistry::builtin();
    tracing::info!(
        formats = ?formats.choices().iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        "Contest formats registered"
    );

    let state = AppState::new(
        Arc::new(PgStore::new(db_pool)),
        Arc::new(RedisCache::new(redis_conn)),
        formats,
        CONFIG.clone(),
    );

    // Build the router
    let app = handlers::app(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
