//! Database schema definitions

pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    country TEXT,
    total_clicks INTEGER NOT NULL DEFAULT 0,
    last_click BIGINT
)
"#;

pub const CREATE_COUNTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    country_code TEXT PRIMARY KEY,
    country_name TEXT,
    total_clicks INTEGER NOT NULL DEFAULT 0
)
"#;

// For the leaderboard ORDER BY
pub const CREATE_INDEX_COUNTRY_CLICKS: &str =
    "CREATE INDEX IF NOT EXISTS idx_countries_clicks ON countries(total_clicks DESC, country_code)";

pub const SEED_COUNTRY: &str =
    "INSERT OR IGNORE INTO countries (country_code, country_name, total_clicks) VALUES (?, ?, ?)";

// === CLICK UPSERTS ===
// Each is one statement so concurrent clicks on the same row never lose an increment.

pub const UPSERT_USER: &str = r#"
INSERT INTO users (user_id, country, total_clicks, last_click)
VALUES (?, ?, 1, ?)
ON CONFLICT(user_id) DO UPDATE SET
    total_clicks = total_clicks + 1,
    country = excluded.country,
    last_click = excluded.last_click
RETURNING total_clicks
"#;

pub const UPSERT_COUNTRY: &str = r#"
INSERT INTO countries (country_code, country_name, total_clicks)
VALUES (?, ?, 1)
ON CONFLICT(country_code) DO UPDATE SET
    total_clicks = total_clicks + 1,
    country_name = excluded.country_name
RETURNING total_clicks
"#;

pub const SUM_COUNTRY_CLICKS: &str = "SELECT COALESCE(SUM(total_clicks), 0) FROM countries";
