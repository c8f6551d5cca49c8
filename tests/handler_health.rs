mod common;

use axum::http::StatusCode;
use serde_json::Value;
use snip::application::services::DeleteAllPolicy;
use snip::domain::redirect_counter::CounterStrategy;
use snip::infrastructure::cache::MemoryCache;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = common::spawn_app();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["registry"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert_eq!(json["checks"]["counter_queue"]["status"], "ok");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_health_degraded_when_registry_unreachable() {
    let mut registry = common::FaultyRegistry::new();
    registry.unreachable = true;

    let state = common::create_test_state(
        Arc::new(registry),
        Arc::new(MemoryCache::new()),
        CounterStrategy::Atomic,
        DeleteAllPolicy::BestEffort,
    );
    let server = common::create_test_server(state);

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["registry"]["status"], "error");
}

#[tokio::test]
async fn test_health_is_not_shadowed_by_token_route() {
    let app = common::spawn_app();

    let response = app.server.get("/health").await;

    assert_ne!(response.status_code(), StatusCode::FOUND);
    assert!(response.json::<Value>().get("checks").is_some());
}
