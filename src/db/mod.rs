//! Database module

mod schema;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

use crate::config::{DatabaseConfig, SeedCountry};
use crate::error::Result;

/// A country row as it appears on the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStat {
    pub country_code: String,
    pub country_name: String,
    pub total_clicks: i64,
}

/// Top countries plus the total over every country
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    pub countries: Vec<CountryStat>,
    pub total_clicks: i64,
}

/// Counters returned after recording a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickCounts {
    pub user_clicks: i64,
    pub country_clicks: i64,
    pub total_clicks: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = if config.is_memory() {
            // Every connection to :memory: opens its own empty database, so the
            // pool holds exactly one connection and never recycles it.
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", config.url))?;
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(schema::CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_COUNTRIES_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(schema::CREATE_INDEX_COUNTRY_CLICKS)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert seed countries that are not present yet; existing rows keep their counts
    pub async fn seed_countries(&self, seeds: &[SeedCountry]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for seed in seeds {
            let result = sqlx::query(schema::SEED_COUNTRY)
                .bind(&seed.code)
                .bind(&seed.name)
                .bind(seed.clicks)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        info!("Seeded {} of {} countries", inserted, seeds.len());
        Ok(inserted)
    }

    /// Count one click for the user and the country, returning the new totals
    pub async fn record_click(
        &self,
        user_id: &str,
        country_code: &str,
        country_name: &str,
    ) -> Result<ClickCounts> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        let (user_clicks,): (i64,) = sqlx::query_as(schema::UPSERT_USER)
            .bind(user_id)
            .bind(country_name)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let (country_clicks,): (i64,) = sqlx::query_as(schema::UPSERT_COUNTRY)
            .bind(country_code)
            .bind(country_name)
            .fetch_one(&mut *tx)
            .await?;

        let (total_clicks,): (i64,) = sqlx::query_as(schema::SUM_COUNTRY_CLICKS)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ClickCounts {
            user_clicks,
            country_clicks,
            total_clicks,
        })
    }

    pub async fn get_user_total(&self, user_id: &str) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT total_clicks FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(clicks,)| clicks).unwrap_or(0))
    }

    /// Top `limit` countries by clicks; ties go to the lower country code.
    /// Ranking and total are read in one transaction so they always agree.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<LeaderboardSnapshot> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT country_code, country_name, total_clicks
            FROM countries
            ORDER BY total_clicks DESC, country_code ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await?;

        let (total_clicks,): (i64,) = sqlx::query_as(schema::SUM_COUNTRY_CLICKS)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let countries = rows
            .into_iter()
            .map(|(country_code, country_name, total_clicks)| CountryStat {
                country_code,
                country_name: country_name.unwrap_or_default(),
                total_clicks,
            })
            .collect();

        Ok(LeaderboardSnapshot {
            countries,
            total_clicks,
        })
    }

    /// Close the pool; later queries fail with `PoolClosed`
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
impl Database {
    pub(crate) async fn get_country(&self, country_code: &str) -> Result<Option<CountryStat>> {
        let row: Option<(String, Option<String>, i64)> = sqlx::query_as(
            "SELECT country_code, country_name, total_clicks FROM countries WHERE country_code = ?",
        )
        .bind(country_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(country_code, country_name, total_clicks)| CountryStat {
            country_code,
            country_name: country_name.unwrap_or_default(),
            total_clicks,
        }))
    }

    pub(crate) async fn get_total_clicks(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(schema::SUM_COUNTRY_CLICKS)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
