//! Click recording: counter upserts followed by leaderboard invalidation

use std::time::Instant;
use tracing::debug;

use crate::config::ClickLeaderboardPolicy;
use crate::db::{CountryStat, Database};
use crate::error::Result;
use crate::leaderboard::Leaderboard;

#[derive(Debug, Clone, Default)]
pub struct Click {
    pub user_id: String,
    pub country_code: String,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub user_clicks: i64,
    pub total_clicks: i64,
    pub leaderboard: Option<Vec<CountryStat>>,
}

/// Record one click, then drop the cached leaderboard.
///
/// Invalidation happens after the write commits, so a leaderboard read that
/// follows this call always sees the new count. Under the cached policy the
/// response carries whatever the cache holds after invalidation: null, unless
/// a concurrent read has already refilled it with post-click data.
pub async fn record_click(
    db: &Database,
    leaderboard: &Leaderboard,
    policy: ClickLeaderboardPolicy,
    click: &Click,
    now: Instant,
) -> Result<ClickOutcome> {
    let counts = db
        .record_click(&click.user_id, &click.country_code, &click.country_name)
        .await?;
    leaderboard.invalidate().await;

    let leaderboard = match policy {
        ClickLeaderboardPolicy::Cached => leaderboard
            .current()
            .await
            .map(|snapshot| snapshot.countries.clone()),
        ClickLeaderboardPolicy::Fresh => Some(leaderboard.read(now).await?.countries.clone()),
    };

    debug!(
        user_id = %click.user_id,
        country_code = %click.country_code,
        user_clicks = counts.user_clicks,
        country_clicks = counts.country_clicks,
        total_clicks = counts.total_clicks,
        "Click recorded"
    );

    Ok(ClickOutcome {
        user_clicks: counts.user_clicks,
        total_clicks: counts.total_clicks,
        leaderboard,
    })
}
