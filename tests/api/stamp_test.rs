//! POST /api/stamp tests

use crate::common::*;
use merkle_stamp::anchoring::ots::{Attestation, OtsProof};
use serde_json::json;
use std::time::Duration;

const DIGEST_HEX: &str = "abd205555c186f833a60c982ffc17c45cca2ee0a30f5b0a4e7339783d024214e";

async fn pool_ok(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/digest")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(b"\xf0\x10opaque-calendar-response")
        .create_async()
        .await
}

async fn pool_down(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/digest")
        .with_status(500)
        .create_async()
        .await
}

#[tokio::test]
async fn test_stamp_quorum_reached() {
    let mut a = mockito::Server::new_async().await;
    let mut b = mockito::Server::new_async().await;
    let mut c = mockito::Server::new_async().await;
    let ma = pool_ok(&mut a).await;
    let mb = pool_ok(&mut b).await;
    let _mc = pool_down(&mut c).await;

    let app = TestApp::new()
        .pools(vec![a.url(), b.url(), c.url()])
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    ma.assert_async().await;
    mb.assert_async().await;

    let servers: Vec<String> = serde_json::from_value(body["servers"].clone()).unwrap();
    assert_eq!(servers.len(), 2);
    assert!(servers.contains(&a.url()));
    assert!(servers.contains(&b.url()));
    assert!(servers.contains(&body["server"].as_str().unwrap().to_string()));

    let proof = OtsProof::from_bytes(&bytes_of(&body["otsFile"])).unwrap();
    let digest = sha256(b"test fixture data");
    assert_eq!(proof.attestations().len(), 2);
    for attestation in proof.attestations() {
        match attestation {
            Attestation::Calendar { url, commitment } => {
                assert!(servers.contains(url));
                assert_eq!(commitment, &digest);
            }
            other => panic!("unexpected attestation {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_stamp_single_success_is_unavailable() {
    let mut a = mockito::Server::new_async().await;
    let mut b = mockito::Server::new_async().await;
    let mut c = mockito::Server::new_async().await;
    let _ma = pool_ok(&mut a).await;
    let _mb = pool_down(&mut b).await;
    let _mc = pool_down(&mut c).await;

    let app = TestApp::new()
        .pools(vec![a.url(), b.url(), c.url()])
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["recoverable"], true);
    assert!(body["error"].as_str().unwrap().contains("1 of 3"));
}

#[tokio::test]
async fn test_stamp_request_deadline_is_gateway_timeout() {
    let a = hanging_upstream().await;
    let b = hanging_upstream().await;

    let app = TestApp::new()
        .pools(vec![a, b])
        .timeouts(Duration::from_secs(10), Duration::from_millis(200))
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT, "body: {body}");
    assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
    assert_eq!(body["recoverable"], true);
    assert!(body["error"].as_str().unwrap().contains("200 ms"));
}

#[tokio::test]
async fn test_stamp_all_pools_timing_out_is_gateway_timeout() {
    let a = hanging_upstream().await;
    let b = hanging_upstream().await;

    let app = TestApp::new()
        .pools(vec![a, b])
        .timeouts(Duration::from_millis(200), Duration::from_secs(10))
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT, "body: {body}");
    assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
}

#[tokio::test]
async fn test_stamp_mixed_timeout_and_refusal_is_unavailable() {
    let hang = hanging_upstream().await;

    let app = TestApp::new()
        .pools(vec![hang, DEAD_URL.to_string()])
        .timeouts(Duration::from_millis(200), Duration::from_secs(10))
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "body: {body}");
    assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_stamp_error_sanitized_in_production() {
    let mut a = mockito::Server::new_async().await;
    let _ma = pool_down(&mut a).await;

    let app = TestApp::new()
        .pools(vec![a.url(), DEAD_URL.to_string()])
        .production()
        .router();

    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("of 2"), "leaked detail: {message}");
    assert!(!message.contains("127.0.0.1"), "leaked detail: {message}");
}

#[tokio::test]
async fn test_stamp_pool_returning_full_proof() {
    let digest = sha256(b"test fixture data");
    let mut a = mockito::Server::new_async().await;
    let mut b = mockito::Server::new_async().await;
    let _ma = a
        .mock("POST", "/digest")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(pending_proof("https://calendar.example", &digest))
        .create_async()
        .await;
    let _mb = pool_ok(&mut b).await;

    let app = TestApp::new().pools(vec![a.url(), b.url()]).router();
    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let proof = OtsProof::from_bytes(&bytes_of(&body["otsFile"])).unwrap();
    assert!(proof.attestations().contains(&Attestation::Calendar {
        url: "https://calendar.example".into(),
        commitment: digest,
    }));
    assert!(proof.attestations().contains(&Attestation::Calendar {
        url: b.url(),
        commitment: digest,
    }));
}

#[tokio::test]
async fn test_stamp_hex_encoded_pool_response() {
    let digest = sha256(b"test fixture data");
    let hex_body = hex::encode(pending_proof("https://calendar.example", &digest));

    let mut a = mockito::Server::new_async().await;
    let mut b = mockito::Server::new_async().await;
    let _ma = a
        .mock("POST", "/digest")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(hex_body.clone())
        .create_async()
        .await;
    let _mb = b
        .mock("POST", "/digest")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(hex_body)
        .create_async()
        .await;

    let app = TestApp::new().pools(vec![a.url(), b.url()]).router();
    let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": DIGEST_HEX })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let proof = OtsProof::from_bytes(&bytes_of(&body["otsFile"])).unwrap();
    // both pools returned the same attestation; the merge keeps one
    assert_eq!(proof.attestations().len(), 1);
}

#[tokio::test]
async fn test_stamp_rejects_bad_digest() {
    for bad in ["abcd", "zz".repeat(32).as_str(), ""] {
        let app = TestApp::new().router();
        let (status, body) = post_json(app, "/api/stamp", json!({ "merkleRootHex": bad })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {bad:?}");
        assert_eq!(body["code"], "INVALID_HASH");
        assert_eq!(body["recoverable"], false);
    }
}

#[tokio::test]
async fn test_stamp_rejects_malformed_json() {
    let app = TestApp::new().router();
    let request = Request::post("/api/stamp")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_stamp_rejects_missing_field() {
    let app = TestApp::new().router();
    let (status, body) = post_json(app, "/api/stamp", json!({ "root": DIGEST_HEX })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}
