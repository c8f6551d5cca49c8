mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::Value;
use snip::domain::repositories::Registry;

#[tokio::test]
async fn test_redirect_success() {
    let app = common::spawn_app();
    let body = common::register(&app.server, "https://example.com/target", "10m").await;
    let token = common::token_of(&body);

    let response = app.server.get(&format!("/{token}")).await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_sequential_redirects_are_all_counted() {
    let app = common::spawn_app();
    let body = common::register(&app.server, "https://example.com", "10m").await;
    let token = common::token_of(&body);

    for _ in 0..25 {
        let response = app.server.get(&format!("/{token}")).await;
        assert_eq!(response.status_code(), StatusCode::FOUND);
    }
    app.state.counter.wait_idle().await;

    let stats = app.server.get(&format!("/stats/{token}")).await;
    assert_eq!(stats.json::<Value>()["redirects"], 25);
}

#[tokio::test]
async fn test_redirect_unknown_token_is_cache_miss() {
    let app = common::spawn_app();

    let response = app.server.get("/doesnotexist").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "cache_miss");
}

#[tokio::test]
async fn test_redirect_never_falls_back_to_registry() {
    let app = common::spawn_app();
    common::seed_registry_only(
        &app.registry,
        "onlyInDb",
        "https://example.com",
        Utc::now() + Duration::minutes(10),
    )
    .await;

    let response = app.server.get("/onlyInDb").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"]["code"], "cache_miss");

    app.state.counter.wait_idle().await;
    assert_eq!(app.registry.get("onlyInDb").await.unwrap().redirects, 0);
}

#[tokio::test]
async fn test_redirect_fails_once_cache_entry_lapses() {
    let app = common::spawn_app();
    let body = common::register(&app.server, "https://example.com", "100ms").await;
    let token = common::token_of(&body);

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    let response = app.server.get(&format!("/{token}")).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"]["code"], "cache_miss");

    // Not swept yet, so the registry still has it.
    app.server
        .get(&format!("/stats/{token}"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_trailing_slash_is_not_a_token() {
    let app = common::spawn_app();
    let body = common::register(&app.server, "https://example.com", "10m").await;
    let token = common::token_of(&body);

    let response = app.server.get(&format!("/{token}/extra")).await;

    response.assert_status_not_found();
}
