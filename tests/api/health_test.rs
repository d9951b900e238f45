//! Health endpoint tests

use crate::common::*;

#[tokio::test]
async fn test_health_ok() {
    let app = TestApp::new().router();

    let (status, body) = send(
        app,
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_served_from_cache() {
    let state = TestApp::new().state();
    let app = merkle_stamp::api::create_router(state.clone());

    let (_, first) = send(
        app.clone(),
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let (_, second) = send(
        app,
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(first["timestamp"], second["timestamp"]);
    assert!(state.health_cache.get().is_some());
}

#[tokio::test]
async fn test_health_refreshed_after_clear() {
    let state = TestApp::new().state();
    let app = merkle_stamp::api::create_router(state.clone());

    let (_, first) = send(
        app.clone(),
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;
    state.health_cache.clear();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let (_, second) = send(
        app,
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_ne!(first["timestamp"], second["timestamp"]);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().router();
    let (status, _) = send(app, Request::get("/api/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stamp_requires_post() {
    let app = TestApp::new().router();
    let (status, _) = send(app, Request::get("/api/stamp").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
