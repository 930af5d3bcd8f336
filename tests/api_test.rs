//! Integration tests for the HTTP surface.

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use cinesync_auth::{TokenEncoder, TokenVerifier};
use cinesync_core::config::AppConfig;
use cinesync_core::types::id::UserId;
use cinesync_realtime::connection::authenticator::WsAuthenticator;

use helpers::TestEngine;

fn test_router(app: &TestEngine) -> (Router, AppConfig) {
    let config = AppConfig::default();
    let verifier = Arc::new(TokenVerifier::new(&config.auth));
    let state = cinesync_api::state::AppState::new(
        Arc::new(config.clone()),
        app.engine.clone(),
        Arc::new(WsAuthenticator::new(verifier)),
    );
    (cinesync_api::router::build_router(state), config)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = TestEngine::new();
    let (router, _) = test_router(&app);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn detailed_health_reports_engine_counters() {
    let app = TestEngine::new();
    let _client = app.connect("ana").await;
    let (router, _) = test_router(&app);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health/detailed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["wsConnections"], 1);
    assert_eq!(json["data"]["rooms"], 0);
}

#[tokio::test]
async fn ws_upgrade_without_token_is_refused() {
    let app = TestEngine::new();
    let (router, _) = test_router(&app);

    let response = router
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Missing query string fails extraction before any upgrade.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ws_upgrade_with_bad_token_is_unauthorized() {
    let app = TestEngine::new();
    let (router, _) = test_router(&app);

    let response = helpers::serve_request(
        router,
        Request::builder()
            .uri("/ws?token=garbage")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn ws_upgrade_with_valid_token_switches_protocols() {
    let app = TestEngine::new();
    let (router, config) = test_router(&app);

    let encoder = TokenEncoder::new(&config.auth);
    let token = encoder.issue(UserId::new(), "ana", 3600).unwrap();

    let response = helpers::serve_request(
        router,
        Request::builder()
            .uri(format!("/ws?token={token}"))
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
}
