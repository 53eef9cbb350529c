//! Leaderboard cache with a freshness window
//!
//! Reads inside the window are served from memory. Recording a click drops the
//! cached snapshot so the next read goes back to the store.
//!
//! Not built on `cached`'s timed store: that needs explicit invalidation and a
//! caller-supplied clock, which the proc macro does not expose.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::{Database, LeaderboardSnapshot};
use crate::error::Result;

/// Where a fresh leaderboard comes from on a cache miss
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn leaderboard(&self, limit: u32) -> Result<LeaderboardSnapshot>;
}

#[async_trait]
impl LeaderboardSource for Database {
    async fn leaderboard(&self, limit: u32) -> Result<LeaderboardSnapshot> {
        self.get_leaderboard(limit).await
    }
}

/// Last computed snapshot and when it was computed
#[derive(Debug)]
pub struct LeaderboardCache {
    snapshot: Option<Arc<LeaderboardSnapshot>>,
    computed_at: Instant,
    ttl: Duration,
}

impl LeaderboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: None,
            computed_at: Instant::now(),
            ttl,
        }
    }

    /// The cached snapshot, if one exists and is younger than the window
    pub fn fresh(&self, now: Instant) -> Option<Arc<LeaderboardSnapshot>> {
        let snapshot = self.snapshot.as_ref()?;
        if now.saturating_duration_since(self.computed_at) < self.ttl {
            Some(snapshot.clone())
        } else {
            None
        }
    }

    pub fn store(&mut self, snapshot: Arc<LeaderboardSnapshot>, now: Instant) {
        self.snapshot = Some(snapshot);
        self.computed_at = now;
    }

    /// Whatever is cached right now, fresh or not
    pub fn current(&self) -> Option<Arc<LeaderboardSnapshot>> {
        self.snapshot.clone()
    }

    /// Drop the snapshot regardless of its age
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

/// Cache-fronted leaderboard owned by the application state
pub struct Leaderboard<S = Database> {
    source: S,
    limit: u32,
    cache: Mutex<LeaderboardCache>,
}

impl<S: LeaderboardSource> Leaderboard<S> {
    pub fn new(source: S, limit: u32, ttl: Duration) -> Self {
        Self {
            source,
            limit,
            cache: Mutex::new(LeaderboardCache::new(ttl)),
        }
    }

    /// Serve the cached snapshot while fresh, otherwise recompute and cache it.
    /// The lock is held across the recompute so an invalidation that arrives
    /// meanwhile is applied after the new snapshot is stored, never before.
    pub async fn read(&self, now: Instant) -> Result<Arc<LeaderboardSnapshot>> {
        let mut cache = self.cache.lock().await;
        if let Some(snapshot) = cache.fresh(now) {
            debug!("Leaderboard cache hit");
            return Ok(snapshot);
        }

        debug!("Leaderboard cache miss, querying store");
        let snapshot = Arc::new(self.source.leaderboard(self.limit).await?);
        cache.store(snapshot.clone(), now);
        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    /// The cached snapshot as it stands, without touching the store
    pub async fn current(&self) -> Option<Arc<LeaderboardSnapshot>> {
        self.cache.lock().await.current()
    }
}
