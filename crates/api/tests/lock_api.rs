//! Acquire-path tests: pricing snapshots, duplicate holds, capacity
//! guards, and all-or-nothing range holds.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use voyago_core::booking::ItemType;
use voyago_core::pricing::PriceFactors;

use common::{
    acquire, availability_for, body_json, build_test_app, get, post_json, seed_capacity,
    TEST_TOTAL_CENTS,
};

#[sqlx::test(migrations = "../db/migrations")]
async fn acquire_returns_lock_with_frozen_snapshot(pool: PgPool) {
    let app = build_test_app(pool);

    let lock = acquire(&app, "hotel", 1, 100, 1, "2026-10-10", None).await;

    assert_eq!(lock["status"], "active");
    assert_eq!(lock["units"], 1);
    assert_eq!(lock["extensions_used"], 0);
    assert_eq!(lock["base_price_cents"], 10_000);
    assert_eq!(lock["taxes_cents"], 1_200);
    assert_eq!(lock["fees_cents"], 500);
    assert_eq!(lock["total_cents"], TEST_TOTAL_CENTS);

    let created: chrono::DateTime<chrono::Utc> =
        lock["created_at"].as_str().unwrap().parse().unwrap();
    let expires: chrono::DateTime<chrono::Utc> =
        lock["expires_at"].as_str().unwrap().parse().unwrap();
    assert_eq!(expires - created, chrono::Duration::minutes(15));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn acquire_applies_multiplicative_factors(pool: PgPool) {
    let app = build_test_app(pool);
    app.signals.set_factors(PriceFactors {
        demand: 1.2,
        season: 1.25,
        time_of_day: 1.0,
        advance_booking: 1.0,
    });

    let lock = acquire(&app, "tour", 3, 100, 2, "2026-10-10", None).await;

    // 10000 * 1.2 * 1.25 = 15000; +12% tax, +5% fee.
    assert_eq!(lock["base_price_cents"], 15_000);
    assert_eq!(lock["taxes_cents"], 1_800);
    assert_eq!(lock["fees_cents"], 750);
    assert_eq!(lock["total_cents"], 17_550);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_active_hold_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    acquire(&app, "hotel", 1, 100, 1, "2026-10-10", None).await;

    let response = post_json(
        &app.router,
        "/api/v1/locks",
        json!({
            "item_type": "hotel",
            "item_id": 1,
            "user_id": 100,
            "session_id": "second-tab",
            "units": 1,
            "start_date": "2026-10-10",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_LOCK");

    // The rejected request must not have touched the ledger.
    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["held"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn insufficient_capacity_is_rejected_without_ledger_change(pool: PgPool) {
    let app = build_test_app(pool.clone());
    seed_capacity(&pool, ItemType::Hotel, 1, "2026-10-10".parse().unwrap(), 1).await;

    let response = post_json(
        &app.router,
        "/api/v1/locks",
        json!({
            "item_type": "hotel",
            "item_id": 1,
            "user_id": 100,
            "session_id": "s1",
            "units": 2,
            "start_date": "2026-10-10",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_CAPACITY");

    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["held"], 0);
    assert_eq!(days[0]["available"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn capacity_five_contention_scenario(pool: PgPool) {
    let app = build_test_app(pool.clone());
    seed_capacity(&pool, ItemType::Tour, 9, "2026-10-10".parse().unwrap(), 5).await;

    // User A holds 3 of 5.
    let lock_a = acquire(&app, "tour", 9, 1, 3, "2026-10-10", None).await;
    let days = availability_for(&app, "tour", 9, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["available"], 2);

    // User B wants 3; only 2 remain.
    let response = post_json(
        &app.router,
        "/api/v1/locks",
        json!({
            "item_type": "tour",
            "item_id": 9,
            "user_id": 2,
            "session_id": "s2",
            "units": 3,
            "start_date": "2026-10-10",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let days = availability_for(&app, "tour", 9, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["available"], 2);

    // A releases; all 5 come back.
    let uri = format!("/api/v1/locks/{}/release", lock_a["id"].as_str().unwrap());
    let response = post_json(&app.router, &uri, json!({ "user_id": 1 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let days = availability_for(&app, "tour", 9, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["available"], 5);

    // User C can now take all 5.
    acquire(&app, "tour", 9, 3, 5, "2026-10-10", None).await;
    let days = availability_for(&app, "tour", 9, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["available"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn range_hold_covers_every_night(pool: PgPool) {
    let app = build_test_app(pool);

    let lock = acquire(&app, "hotel", 1, 100, 2, "2026-10-10", Some("2026-10-13")).await;
    assert_eq!(lock["start_date"], "2026-10-10");
    assert_eq!(lock["end_date"], "2026-10-13");
    // Three nights at the neutral base.
    assert_eq!(lock["total_cents"], 3 * TEST_TOTAL_CENTS);

    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-13").await;
    for day in &days {
        assert_eq!(day["held"], 2);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn range_hold_is_all_or_nothing(pool: PgPool) {
    let app = build_test_app(pool.clone());
    // Middle night is sold out.
    seed_capacity(&pool, ItemType::Hotel, 1, "2026-10-11".parse().unwrap(), 0).await;

    let response = post_json(
        &app.router,
        "/api/v1/locks",
        json!({
            "item_type": "hotel",
            "item_id": 1,
            "user_id": 100,
            "session_id": "s1",
            "units": 1,
            "start_date": "2026-10-10",
            "end_date": "2026-10-13",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_CAPACITY");

    // The first night's partial hold must have been rolled back.
    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-13").await;
    assert_eq!(days[0]["held"], 0);
    assert_eq!(days[1]["held"], 0);
    assert_eq!(days[2]["held"], 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn multi_day_tour_request_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json(
        &app.router,
        "/api/v1/locks",
        json!({
            "item_type": "tour",
            "item_id": 9,
            "user_id": 100,
            "session_id": "s1",
            "units": 1,
            "start_date": "2026-10-10",
            "end_date": "2026-10-13",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unit_bounds_are_enforced(pool: PgPool) {
    let app = build_test_app(pool);

    for units in [0, -1, 9] {
        let response = post_json(
            &app.router,
            "/api/v1/locks",
            json!({
                "item_type": "hotel",
                "item_id": 1,
                "user_id": 100,
                "session_id": "s1",
                "units": units,
                "start_date": "2026-10-10",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "units={units}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_lock_listing_filters_by_status(pool: PgPool) {
    let app = build_test_app(pool);

    let lock_a = acquire(&app, "hotel", 1, 100, 1, "2026-10-10", None).await;
    acquire(&app, "hotel", 2, 100, 1, "2026-10-10", None).await;
    acquire(&app, "hotel", 3, 200, 1, "2026-10-10", None).await;

    let uri = format!("/api/v1/locks/{}/release", lock_a["id"].as_str().unwrap());
    post_json(&app.router, &uri, json!({ "user_id": 100 })).await;

    let response = get(&app.router, "/api/v1/locks?user_id=100").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = get(&app.router, "/api/v1/locks?user_id=100&status=active").await;
    let body = body_json(response).await;
    let active = body["data"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["item_id"], 2);
}
