//! PopClick - click counter backend with a per-country leaderboard
//!
//! Clients post clicks attributed to a user and a country; the service keeps
//! per-user and per-country counters in SQLite and serves a top-N country
//! leaderboard through a short-lived cache.

pub mod clicks;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{AppError, Result};
pub use web::AppState;
