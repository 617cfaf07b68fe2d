mod common;

use axum::http::StatusCode;
use sqlx::PgPool;

use common::{body_json, build_test_app, get};

#[sqlx::test(migrations = "../db/migrations")]
async fn health_check_reports_ok(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db_healthy"], true);
    assert!(body["db_latency_ms"].is_u64());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app.router, "/api/v1/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn responses_carry_a_request_id(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app.router, "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
