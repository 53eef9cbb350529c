//! Configuration management

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the single-page frontend
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or ":memory:" for a store that lives and dies with the process
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: ":memory:".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == ":memory:"
    }
}

/// What `POST /api/click` puts in its `leaderboard` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickLeaderboardPolicy {
    /// Whatever the cache holds once the click has invalidated it, normally null
    #[default]
    Cached,
    /// Recompute the leaderboard synchronously as part of the click
    Fresh,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Leaderboard freshness window in milliseconds
    pub ttl_ms: u64,
    pub leaderboard_size: u32,
    pub click_leaderboard: ClickLeaderboardPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 2000,
            leaderboard_size: 10,
            click_leaderboard: ClickLeaderboardPolicy::Cached,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedCountry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub clicks: i64,
}

impl SeedCountry {
    fn new(code: &str, name: &str, clicks: i64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            clicks,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub countries: Vec<SeedCountry>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            countries: vec![
                SeedCountry::new("mx", "México", 15234),
                SeedCountry::new("es", "España", 12876),
                SeedCountry::new("ar", "Argentina", 9876),
                SeedCountry::new("co", "Colombia", 8765),
                SeedCountry::new("cl", "Chile", 7654),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("POPCLICK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain PORT wins over everything else, as hosting platforms expect
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.cache.leaderboard_size == 0 {
            anyhow::bail!("Invalid leaderboard_size: 0 is not allowed");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid logging level '{}'. Must be one of: {:?}", self.logging.level, valid_levels);
        }

        let mut seen = HashSet::new();
        for country in &self.seed.countries {
            if country.code.is_empty() {
                anyhow::bail!("Seed country '{}' has an empty code", country.name);
            }
            if country.clicks < 0 {
                anyhow::bail!("Seed country '{}' has negative clicks", country.code);
            }
            if !seen.insert(country.code.as_str()) {
                anyhow::bail!("Seed country code '{}' is listed twice", country.code);
            }
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
