//! # Vitrine API Server
//!
//! REST API server for the Vitrine storefront: catalog, cart, checkout,
//! reviews, wishlists and an SSE event feed backed by Redis Streams.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p vitrine-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrine_api::{
    app::{build_router, AppState},
    config::Config,
};
use vitrine_shared::db::{migrations::run_migrations, pool};
use vitrine_shared::redis::{RedisClient, RedisConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Vitrine API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database pool with migrations applied before serving traffic
    let db_config = pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..pool::DatabaseConfig::default()
    };
    let db = pool::create_pool(db_config).await?;
    run_migrations(&db).await?;

    // Redis for event fan-out
    let redis_config = RedisConfig::from_env()?;
    let redis = RedisClient::new(redis_config).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(db, redis, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
