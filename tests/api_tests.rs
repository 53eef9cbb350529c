//! Integration tests for the PopClick API
//!
//! Each test drives the full router against its own in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use popclick::config::ClickLeaderboardPolicy;
use popclick::{AppState, Config, Database};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SEED_TOTAL: i64 = 15234 + 12876 + 9876 + 8765 + 7654;

// =============================================================================
// Test Helpers
// =============================================================================

async fn create_test_state(policy: ClickLeaderboardPolicy) -> Arc<AppState> {
    let mut config = Config::default();
    config.cache.click_leaderboard = policy;

    let db = Database::new(&config.database).await.unwrap();
    db.run_migrations().await.unwrap();
    db.seed_countries(&config.seed.countries).await.unwrap();

    Arc::new(AppState::new(db, &config))
}

fn create_test_app(state: Arc<AppState>) -> Router {
    popclick::web::router(state, "static")
}

async fn body_to_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn make_post_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn make_get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn click(app: &Router, user_id: &str, code: &str, name: &str) -> Value {
    let body = json!({ "userId": user_id, "countryCode": code, "countryName": name });
    let response = app
        .clone()
        .oneshot(make_post_request("/api/click", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_to_json(response.into_body()).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app.clone().oneshot(make_get_request(uri)).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn country_total(leaderboard: &Value, code: &str) -> i64 {
    leaderboard
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["countryCode"] == code)
        .and_then(|c| c["totalClicks"].as_i64())
        .unwrap()
}

// =============================================================================
// Click Tests
// =============================================================================

#[tokio::test]
async fn test_first_click_on_seeded_country() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let (_, before) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(before["totalClicks"], SEED_TOTAL);

    let body = click(&app, "u1", "mx", "México").await;
    assert_eq!(body["userClicks"], 1);
    assert_eq!(body["totalClicks"], SEED_TOTAL + 1);

    let (_, after) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&after["leaderboard"], "mx"), 15235);
    assert_eq!(after["totalClicks"], SEED_TOTAL + 1);
}

#[tokio::test]
async fn test_user_total_counts_every_click() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    for expected in 1..=5 {
        let body = click(&app, "alice", "es", "España").await;
        assert_eq!(body["userClicks"], expected);
    }
    click(&app, "bob", "es", "España").await;

    let (status, alice) = get_json(&app, "/api/user/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alice, json!({ "userClicks": 5 }));

    let (_, bob) = get_json(&app, "/api/user/bob").await;
    assert_eq!(bob["userClicks"], 1);
}

#[tokio::test]
async fn test_unknown_user_has_zero_clicks() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let (status, body) = get_json(&app, "/api/user/unknown").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "userClicks": 0 }));
}

#[tokio::test]
async fn test_click_with_missing_fields_is_not_rejected() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let response = app
        .clone()
        .oneshot(make_post_request("/api/click", "{}".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["userClicks"], 1);
    assert_eq!(body["totalClicks"], SEED_TOTAL + 1);
}

#[tokio::test]
async fn test_concurrent_clicks_lose_no_updates() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let tasks: Vec<_> = (0..40)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { click(&app, "racer", "cl", "Chile").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let (_, user) = get_json(&app, "/api/user/racer").await;
    assert_eq!(user["userClicks"], 40);

    let (_, board) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&board["leaderboard"], "cl"), 7654 + 40);
    assert_eq!(board["totalClicks"], SEED_TOTAL + 40);
}

// =============================================================================
// Leaderboard Tests
// =============================================================================

#[tokio::test]
async fn test_leaderboard_is_sorted_and_capped() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    for i in 0..8 {
        click(&app, "u", &format!("x{}", i), &format!("Extra {}", i)).await;
    }

    let (status, body) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(status, StatusCode::OK);

    let entries = body["leaderboard"].as_array().unwrap();
    assert_eq!(entries.len(), 10);
    let totals: Vec<i64> = entries.iter().map(|c| c["totalClicks"].as_i64().unwrap()).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(entries[0]["countryCode"], "mx");
    assert_eq!(entries[0]["countryName"], "México");

    // 13 countries exist; the total covers all of them, not just the top 10
    assert_eq!(body["totalClicks"], SEED_TOTAL + 8);
}

#[tokio::test]
async fn test_repeated_reads_return_identical_data() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let (_, first) = get_json(&app, "/api/leaderboard").await;
    let (_, second) = get_json(&app, "/api/leaderboard").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_click_invalidates_cached_leaderboard() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let (_, warm) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&warm["leaderboard"], "ar"), 9876);

    click(&app, "u1", "ar", "Argentina").await;

    // Well inside the freshness window, yet the click is visible
    let (_, after) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&after["leaderboard"], "ar"), 9877);
    assert_eq!(after["totalClicks"], SEED_TOTAL + 1);
}

#[tokio::test]
async fn test_cached_policy_click_returns_null_leaderboard() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    // Nothing cached yet
    let body = click(&app, "u1", "co", "Colombia").await;
    assert_eq!(body["leaderboard"], Value::Null);

    // A warm cache is dropped by the click, so the response never carries
    // pre-click counts next to a post-click total
    let (_, warm) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&warm["leaderboard"], "co"), 8765 + 1);

    let body = click(&app, "u1", "co", "Colombia").await;
    assert_eq!(body["leaderboard"], Value::Null);
    assert_eq!(body["userClicks"], 2);
    assert_eq!(body["totalClicks"], SEED_TOTAL + 2);

    let (_, after) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(country_total(&after["leaderboard"], "co"), 8765 + 2);
}

#[tokio::test]
async fn test_fresh_policy_returns_current_leaderboard() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Fresh).await);

    let body = click(&app, "u1", "mx", "México").await;

    assert_eq!(body["userClicks"], 1);
    assert_eq!(country_total(&body["leaderboard"], "mx"), 15235);

    let (_, board) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(board["leaderboard"], body["leaderboard"]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[tokio::test]
async fn test_storage_failure_returns_500_with_message() {
    let state = create_test_state(ClickLeaderboardPolicy::Cached).await;
    state.db.close().await;
    let app = create_test_app(state);

    let (status, body) = get_json(&app, "/api/user/u1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let (status, body) = get_json(&app, "/api/leaderboard").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let response = app
        .clone()
        .oneshot(make_post_request(
            "/api/click",
            json!({ "userId": "u1", "countryCode": "mx", "countryName": "México" }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let request = Request::builder()
        .uri("/api/leaderboard")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_frontend_served_for_unknown_paths() {
    let app = create_test_app(create_test_state(ClickLeaderboardPolicy::Cached).await);

    let response = app.oneshot(make_get_request("/some/client/route")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("<html"));
}
