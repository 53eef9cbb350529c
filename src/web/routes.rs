//! HTTP API routes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};

use super::AppState;
use crate::clicks::{self, Click};
use crate::db::CountryStat;
use crate::error::Result;

/// Click body; missing fields become empty strings rather than a rejection
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickRequest {
    pub user_id: String,
    pub country_code: String,
    pub country_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub user_clicks: i64,
    pub total_clicks: i64,
    pub leaderboard: Option<Vec<CountryStat>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<CountryStat>,
    pub total_clicks: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_clicks: i64,
}

/// API: Record a click for a user and country
pub async fn api_click(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClickRequest>,
) -> Result<Json<ClickResponse>> {
    let click = Click {
        user_id: body.user_id,
        country_code: body.country_code,
        country_name: body.country_name,
    };

    let outcome = clicks::record_click(
        &state.db,
        &state.leaderboard,
        state.click_policy,
        &click,
        Instant::now(),
    )
    .await?;

    Ok(Json(ClickResponse {
        user_clicks: outcome.user_clicks,
        total_clicks: outcome.total_clicks,
        leaderboard: outcome.leaderboard,
    }))
}

/// API: Get the top countries (cached for the freshness window)
pub async fn api_leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<LeaderboardResponse>> {
    let snapshot = state.leaderboard.read(Instant::now()).await?;

    Ok(Json(LeaderboardResponse {
        leaderboard: snapshot.countries.clone(),
        total_clicks: snapshot.total_clicks,
    }))
}

/// API: Get a user's click total, 0 if they never clicked
pub async fn api_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user_clicks = state.db.get_user_total(&user_id).await?;
    Ok(Json(UserResponse { user_clicks }))
}
