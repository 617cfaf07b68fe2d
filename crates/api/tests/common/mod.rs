//! Shared harness for integration tests.
//!
//! Builds the full application router with the same middleware stack
//! as production, but with a [`ManualClock`] and [`StaticSignals`] so
//! tests can drive expiry and shift pricing deterministically.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response};
use axum::Router;
use chrono::NaiveDate;
use sqlx::PgPool;
use tower::ServiceExt;

use voyago_api::config::{EngineConfig, ServerConfig};
use voyago_api::engine::{LockEngine, StaticSignals};
use voyago_api::router::build_app_router;
use voyago_api::state::AppState;
use voyago_core::booking::ItemType;
use voyago_core::clock::ManualClock;
use voyago_core::types::DbId;
use voyago_db::repositories::InventoryRepo;

/// Base price served by the test signals, in cents.
pub const TEST_BASE_CENTS: i64 = 10_000;

/// Snapshot total for one unit-night at the test base price:
/// 10000 + 12% taxes + 5% fees.
pub const TEST_TOTAL_CENTS: i64 = 11_700;

/// A fully wired test application.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub clock: Arc<ManualClock>,
    pub signals: Arc<StaticSignals>,
    pub engine: Arc<LockEngine>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application with default engine tunables.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, EngineConfig::default())
}

/// Build the full application with custom engine tunables (e.g. the
/// refresh-price-on-extend policy).
pub fn build_test_app_with(pool: PgPool, engine_config: EngineConfig) -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualClock::default());
    let signals = Arc::new(StaticSignals::default());

    let engine = Arc::new(LockEngine::new(
        pool.clone(),
        clock.clone(),
        signals.clone(),
        engine_config,
    ));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        engine: engine.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        clock,
        signals,
        engine,
    }
}

/// Upsert total capacity for one (item, day).
pub async fn seed_capacity(
    pool: &PgPool,
    item_type: ItemType,
    item_id: DbId,
    day: NaiveDate,
    capacity: i32,
) {
    InventoryRepo::set_capacity(pool, item_type, item_id, day, capacity)
        .await
        .expect("failed to seed capacity");
}

/// Send a GET request through the full middleware stack.
pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed")
}

/// Send a POST request with a JSON body.
pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed")
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not valid JSON")
}

/// Acquire a hold via the API and return the created lock's JSON.
pub async fn acquire(
    app: &TestApp,
    item_type: &str,
    item_id: DbId,
    user_id: DbId,
    units: i32,
    start_date: &str,
    end_date: Option<&str>,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "item_type": item_type,
        "item_id": item_id,
        "user_id": user_id,
        "session_id": format!("session-{user_id}"),
        "units": units,
        "start_date": start_date,
    });
    if let Some(end) = end_date {
        body["end_date"] = serde_json::json!(end);
    }

    let response = post_json(&app.router, "/api/v1/locks", body).await;
    assert_eq!(
        response.status(),
        axum::http::StatusCode::CREATED,
        "acquire should succeed"
    );
    body_json(response).await["data"].clone()
}

/// Read one day's availability row from the calendar endpoint.
pub async fn availability_for(
    app: &TestApp,
    item_type: &str,
    item_id: DbId,
    day: &str,
    end: &str,
) -> Vec<serde_json::Value> {
    let uri = format!(
        "/api/v1/availability/{item_type}/{item_id}?start_date={day}&end_date={end}"
    );
    let response = get(&app.router, &uri).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .expect("availability data is an array")
        .clone()
}
