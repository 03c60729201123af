//! Router-level tests: the full Axum stack driven through `oneshot`
//! with the mock store behind it. Covers the auth gate, cookie issuance,
//! validation failures, and an end-to-end room session.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use room_service::config::Config;
use room_service::middleware::ROOM_TOKEN_COOKIE;
use room_service::routes::{build_routes, AppState};
use room_test_utils::{MockStore, RecordingNotifier};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config(max_members: u64) -> Config {
    let vars: HashMap<String, String> = HashMap::from([
        (
            "REDIS_URL".to_string(),
            "redis://localhost:6379".to_string(),
        ),
        ("ROOM_MAX_MEMBERS".to_string(), max_members.to_string()),
    ]);
    Config::from_vars(&vars).unwrap()
}

/// Standalone recorder handle for tests; unlike `install_recorder` this can
/// be built once per app without touching the global recorder.
fn test_metrics_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn app_with_capacity(max_members: u64) -> (Router, MockStore) {
    let store = MockStore::new();
    let notifier = RecordingNotifier::new();
    let state = Arc::new(AppState::new(
        Arc::new(store.clone()),
        Arc::new(notifier),
        test_config(max_members),
    ));
    (build_routes(state, test_metrics_handle()), store)
}

fn app() -> (Router, MockStore) {
    app_with_capacity(50)
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("{ROOM_TOKEN_COOKIE}={token}"));
    }
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    builder.body(body).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the token out of the join response's Set-Cookie header.
fn cookie_token(response: &axum::response::Response) -> String {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let pair = cookie.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, ROOM_TOKEN_COOKIE);
    value.to_string()
}

async fn create_room(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(request("POST", "/api/v1/rooms", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["room_code"].as_str().unwrap().to_string()
}

async fn join_room(app: &Router, code: &str, body: Option<&str>) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/join"),
            None,
            body,
        ))
        .await
        .unwrap();
    let status = response.status();
    let token = if status == StatusCode::OK {
        cookie_token(&response)
    } else {
        String::new()
    };
    (status, token)
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (app, _) = app();

    let health = app
        .clone()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let ready = app
        .clone()
        .oneshot(request("GET", "/ready", None, None))
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    let json = body_json(ready).await;
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() {
    let (app, _) = app();

    // A request to drive the HTTP metrics middleware
    create_room(&app).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Prometheus text format renders without auth
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8(bytes.to_vec()).is_ok());
}

#[tokio::test]
async fn test_create_room_returns_a_code() {
    let (app, _) = app();
    let code = create_room(&app).await;
    assert!(room_service::models::is_valid_room_code(&code));
}

#[tokio::test]
async fn test_exists_endpoint() {
    let (app, _) = app();
    let code = create_room(&app).await;

    let found = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/exists"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(found).await["exists"], true);

    let missing = app
        .clone()
        .oneshot(request("GET", "/api/v1/rooms/ZZZZZZ/exists", None, None))
        .await
        .unwrap();
    assert_eq!(body_json(missing).await["exists"], false);
}

#[tokio::test]
async fn test_join_issues_http_only_cookie() {
    let (app, _) = app();
    let code = create_room(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/join"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    // First join activates the room; the credential lives as long as it does
    assert!(cookie.contains("Max-Age=600"));

    // Body echoes the same token the cookie carries
    let token = cookie_token(&response);
    let json = body_json(response).await;
    assert_eq!(json["token"], token);
}

#[tokio::test]
async fn test_join_unknown_room_is_404() {
    let (app, _) = app();
    let (status, _) = join_room(&app, "ZZZZZZ", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_rejects_malformed_body() {
    let (app, _) = app();
    let code = create_room(&app).await;

    let (status, _) = join_room(&app, &code, Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_rejects_oversized_display_name() {
    let (app, _) = app();
    let code = create_room(&app).await;

    let long = "x".repeat(101);
    let body = serde_json::json!({ "display_name": long }).to_string();
    let (status, _) = join_room(&app, &code, Some(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_membership() {
    let (app, _) = app();
    let code = create_room(&app).await;

    let protected = [
        ("GET", format!("/api/v1/rooms/{code}/ttl")),
        ("DELETE", format!("/api/v1/rooms/{code}")),
        ("POST", format!("/api/v1/rooms/{code}/messages")),
        ("GET", format!("/api/v1/rooms/{code}/messages")),
        (
            "POST",
            format!("/api/v1/rooms/{code}/messages/some-id/reactions"),
        ),
        ("DELETE", format!("/api/v1/rooms/{code}/messages/some-id")),
        ("POST", format!("/api/v1/rooms/{code}/typing")),
    ];

    for (method, uri) in protected {
        // No cookie at all
        let bare = app
            .clone()
            .oneshot(request(method, &uri, None, None))
            .await
            .unwrap();
        assert_eq!(bare.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        // A cookie that is not a member of this room
        let forged = app
            .clone()
            .oneshot(request(method, &uri, Some("not-a-member"), None))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        let json = body_json(forged).await;
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_message_flow_over_http() {
    let (app, _) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, Some(r#"{"display_name":"alice"}"#)).await;

    let posted = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&token),
            Some(r#"{"sender":"alice","text":"hello"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(posted.status(), StatusCode::CREATED);
    let message = body_json(posted).await;
    assert_eq!(message["text"], "hello");
    assert_eq!(message["is_me"], true);
    let message_id = message["id"].as_str().unwrap().to_string();

    // React, then delete, through the HTTP surface
    let reacted = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/messages/{message_id}/reactions"),
            Some(&token),
            Some(r#"{"emoji":"👍"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(reacted.status(), StatusCode::OK);
    let reacted = body_json(reacted).await;
    assert_eq!(reacted["reactions"][0]["mine"], true);

    let deleted = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/rooms/{code}/messages/{message_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await["deleted"], true);

    let listed = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let listed = body_json(listed).await;
    assert_eq!(listed["messages"].as_array().unwrap().len(), 1);
    assert_eq!(listed["messages"][0]["text"], "This message was deleted.");
}

#[tokio::test]
async fn test_post_rejects_oversized_text() {
    let (app, _) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, None).await;

    let body = serde_json::json!({
        "sender": "alice",
        "text": "x".repeat(1001),
    })
    .to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&token),
            Some(&body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_post_rejects_empty_text() {
    let (app, _) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, None).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&token),
            Some(r#"{"sender":"alice","text":"   "}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_typing_is_accepted() {
    let (app, _) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, None).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/typing"),
            Some(&token),
            Some(r#"{"display_name":"alice","is_typing":true}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_ttl_endpoint() {
    let (app, store) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, None).await;

    store.advance(100);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/ttl"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ttl"], 500);
}

#[tokio::test]
async fn test_destroy_room_end_to_end() {
    let (app, _) = app();
    let code = create_room(&app).await;
    let (_, token) = join_room(&app, &code, None).await;

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/v1/rooms/{code}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["destroyed"], true);

    // Room is gone for everyone
    let exists = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/exists"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(exists).await["exists"], false);

    // The old credential dies with the membership set
    let stale = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/ttl"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_session_at_capacity_two() {
    let (app, _) = app_with_capacity(2);
    let code = create_room(&app).await;

    let (s1, alice) = join_room(&app, &code, Some(r#"{"display_name":"alice"}"#)).await;
    assert_eq!(s1, StatusCode::OK);
    let (s2, bob) = join_room(&app, &code, Some(r#"{"display_name":"bob"}"#)).await;
    assert_eq!(s2, StatusCode::OK);
    assert_ne!(alice, bob);

    // Third seat does not exist
    let full = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/join"),
            None,
            Some(r#"{"display_name":"carol"}"#),
        ))
        .await
        .unwrap();
    assert_eq!(full.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(full).await["error"]["code"], "ROOM_FULL");

    // An existing member re-joining is not turned away
    let rejoin = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/join"),
            Some(&alice),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(rejoin.status(), StatusCode::OK);
    assert_eq!(cookie_token(&rejoin), alice);

    // Alice posts; Bob sees it as not-his
    app.clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&alice),
            Some(r#"{"sender":"alice","text":"hi bob"}"#),
        ))
        .await
        .unwrap();

    let listed = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/rooms/{code}/messages"),
            Some(&bob),
            None,
        ))
        .await
        .unwrap();
    let listed = body_json(listed).await;
    assert_eq!(listed["messages"][0]["text"], "hi bob");
    assert_eq!(listed["messages"][0]["is_me"], false);
}
