//! Web server module

mod middleware;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::{path::Path, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::config::{ClickLeaderboardPolicy, Config};
use crate::db::Database;
use crate::leaderboard::Leaderboard;
use middleware::AccessLogLayer;

pub struct AppState {
    pub db: Database,
    pub leaderboard: Leaderboard,
    pub click_policy: ClickLeaderboardPolicy,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        let leaderboard = Leaderboard::new(db.clone(), config.cache.leaderboard_size, config.cache.ttl());
        Self {
            db,
            leaderboard,
            click_policy: config.cache.click_leaderboard,
        }
    }
}

/// Build the application router: JSON API plus the single-page frontend
pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    // Unknown paths get index.html so client-side routing works
    let frontend = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/click", post(routes::api_click))
        .route("/api/leaderboard", get(routes::api_leaderboard))
        .route("/api/user/:user_id", get(routes::api_user))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .layer(AccessLogLayer)
        .with_state(state)
}

pub async fn start_server(config: &Config, state: Arc<AppState>) -> Result<()> {
    let app = router(state, &config.server.static_dir);

    let addr = config.server_address();
    info!("Web server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
