//! PopClick server entry point

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use popclick::{AppState, Config, Database};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;

    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));

    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting PopClick...");
    info!(
        "Leaderboard: top {} countries, {}ms freshness window, click response policy {:?}",
        config.cache.leaderboard_size, config.cache.ttl_ms, config.cache.click_leaderboard
    );

    // The store starts over from the seed list on every start when in memory
    let db = Database::new(&config.database).await?;
    db.run_migrations().await?;
    db.seed_countries(&config.seed.countries).await?;
    info!("Database initialized ({})", config.database.url);

    let state = Arc::new(AppState::new(db, &config));

    popclick::web::start_server(&config, state).await?;

    Ok(())
}
