mod common;

use axum::http::StatusCode;
use sqlx::PgPool;
use voyago_core::booking::ItemType;

use common::{
    acquire, availability_for, body_json, build_test_app, get, seed_capacity, TEST_BASE_CENTS,
};

#[sqlx::test(migrations = "../db/migrations")]
async fn untouched_days_report_default_capacity(pool: PgPool) {
    let app = build_test_app(pool);

    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-13").await;
    assert_eq!(days.len(), 3);
    for day in &days {
        assert_eq!(day["capacity"], 10);
        assert_eq!(day["held"], 0);
        assert_eq!(day["confirmed"], 0);
        assert_eq!(day["available"], 10);
        assert_eq!(day["price_cents"], TEST_BASE_CENTS);
    }
    assert_eq!(days[0]["date"], "2026-10-10");
    assert_eq!(days[2]["date"], "2026-10-12");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn counters_reflect_active_holds(pool: PgPool) {
    let app = build_test_app(pool);
    seed_capacity(&app.pool, ItemType::Hotel, 7, "2026-10-10".parse().unwrap(), 5).await;

    acquire(&app, "hotel", 7, 100, 2, "2026-10-10", None).await;

    let days = availability_for(&app, "hotel", 7, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["capacity"], 5);
    assert_eq!(days[0]["held"], 2);
    assert_eq!(days[0]["confirmed"], 0);
    assert_eq!(days[0]["available"], 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn prices_track_current_signals(pool: PgPool) {
    let app = build_test_app(pool);

    app.signals.set_base_price_cents(20_000);
    let days = availability_for(&app, "hotel", 1, "2026-10-10", "2026-10-11").await;
    assert_eq!(days[0]["price_cents"], 20_000);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn inverted_range_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(
        &app.router,
        "/api/v1/availability/hotel/1?start_date=2026-10-13&end_date=2026-10-10",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oversized_range_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(
        &app.router,
        "/api/v1/availability/hotel/1?start_date=2026-01-01&end_date=2026-12-31",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_item_type_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(
        &app.router,
        "/api/v1/availability/cruise/1?start_date=2026-10-10&end_date=2026-10-11",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
