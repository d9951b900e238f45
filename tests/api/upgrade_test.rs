//! POST /api/upgrade tests

use crate::common::*;
use merkle_stamp::anchoring::ots::{has_bitcoin_attestation, MAGIC, VERSION};
use serde_json::json;
use std::time::Duration;

fn commitment() -> [u8; 32] {
    sha256(b"pending commitment")
}

fn timestamp_path() -> String {
    format!("/timestamp/{}", hex::encode(commitment()))
}

async fn calendar_anchored(server: &mut mockito::ServerGuard, height: u64) -> mockito::Mock {
    server
        .mock("GET", timestamp_path().as_str())
        .with_status(200)
        .with_header("content-type", "application/vnd.opentimestamps.v1")
        .with_body(bitcoin_stream(height))
        .create_async()
        .await
}

async fn calendar_pending(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", timestamp_path().as_str())
        .with_status(404)
        .with_body("Pending confirmation in Bitcoin blockchain")
        .create_async()
        .await
}

#[tokio::test]
async fn test_upgrade_still_pending() {
    let mut cal = mockito::Server::new_async().await;
    let mock = calendar_pending(&mut cal).await;

    let proof = pending_proof(&cal.url(), &commitment());
    let app = TestApp::new().calendars(vec![cal.url()]).router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    mock.assert_async().await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["upgraded"], false);
    assert_eq!(bytes_of(&body["otsFile"]), proof);
    assert!(body.get("blockHeight").is_none());
    assert!(body.get("calendarServer").is_none());
}

#[tokio::test]
async fn test_upgrade_confirmed() {
    let mut cal = mockito::Server::new_async().await;
    let _mock = calendar_anchored(&mut cal, 799_995).await;

    let proof = pending_proof(&cal.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![cal.url()])
        .tip(FakeTip::at(800_000))
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["upgraded"], true);
    assert_eq!(body["blockHeight"], 799_995);
    assert_eq!(body["confirmations"], 6);
    assert_eq!(body["tipHeight"], 800_000);
    assert_eq!(body["calendarServer"], cal.url());

    let upgraded = bytes_of(&body["otsFile"]);
    assert!(upgraded.starts_with(&MAGIC));
    assert_eq!(has_bitcoin_attestation(&upgraded).block_height, Some(799_995));
}

#[tokio::test]
async fn test_upgrade_anchored_below_min_confirmations() {
    let mut cal = mockito::Server::new_async().await;
    let _mock = calendar_anchored(&mut cal, 799_999).await;

    let proof = pending_proof(&cal.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![cal.url()])
        .tip(FakeTip::at(800_000))
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "anchored");
    assert_eq!(body["confirmations"], 2);
}

#[tokio::test]
async fn test_upgrade_tip_unavailable_stays_anchored() {
    let mut cal = mockito::Server::new_async().await;
    let _mock = calendar_anchored(&mut cal, 799_995).await;

    let proof = pending_proof(&cal.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![cal.url()])
        .tip(FakeTip::down())
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "anchored");
    assert_eq!(body["blockHeight"], 799_995);
    assert!(body.get("confirmations").is_none());
    assert!(body.get("tipHeight").is_none());
}

#[tokio::test]
async fn test_upgrade_first_answer_wins_over_pending_calendar() {
    let mut slow = mockito::Server::new_async().await;
    let mut fast = mockito::Server::new_async().await;
    let _pending = calendar_pending(&mut slow).await;
    let _anchored = calendar_anchored(&mut fast, 799_990).await;

    let proof = pending_proof(&slow.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![slow.url(), fast.url()])
        .tip(FakeTip::at(800_000))
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blockHeight"], 799_990);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["calendarServer"], fast.url());
}

#[tokio::test]
async fn test_upgrade_prefers_slower_bitcoin_answer() {
    let mut fast = mockito::Server::new_async().await;
    let _echo = fast
        .mock("GET", timestamp_path().as_str())
        .with_status(200)
        .with_header("content-type", "application/vnd.opentimestamps.v1")
        .with_body(pending_proof("https://finney.example", &commitment()))
        .create_async()
        .await;
    let slow = delayed_upstream(bitcoin_stream(799_990), Duration::from_millis(300)).await;

    let proof = pending_proof(&fast.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![fast.url(), slow.clone()])
        .tip(FakeTip::at(800_000))
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["upgraded"], true);
    assert_eq!(body["blockHeight"], 799_990);
    assert_eq!(body["calendarServer"], slow);
}

#[tokio::test]
async fn test_upgrade_pending_answers_fall_back_to_first() {
    let mut cal = mockito::Server::new_async().await;
    let _echo = cal
        .mock("GET", timestamp_path().as_str())
        .with_status(200)
        .with_header("content-type", "application/vnd.opentimestamps.v1")
        .with_body(pending_proof("https://finney.example", &commitment()))
        .create_async()
        .await;

    let proof = pending_proof(&cal.url(), &commitment());
    let app = TestApp::new()
        .calendars(vec![cal.url(), DEAD_URL.to_string()])
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["calendarServer"], cal.url());
    assert!(bytes_of(&body["otsFile"]).len() > proof.len());
}

#[tokio::test]
async fn test_upgrade_already_anchored_skips_calendars() {
    let mut cal = mockito::Server::new_async().await;
    let mock = cal
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut proof = pending_proof(&cal.url(), &commitment());
    proof.extend_from_slice(&bitcoin_stream(700_000));

    let app = TestApp::new()
        .calendars(vec![cal.url()])
        .tip(FakeTip::at(800_000))
        .router();
    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(bytes_of(&body["otsFile"]), proof);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upgrade_all_calendars_unreachable() {
    let proof = pending_proof(DEAD_URL, &commitment());
    let app = TestApp::new()
        .calendars(vec![DEAD_URL.to_string()])
        .router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["recoverable"], true);
}

#[tokio::test]
async fn test_upgrade_unrecognised_header_passes_through() {
    let garbage: Vec<u8> = (1..=40).collect();
    let app = TestApp::new().router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": garbage })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(bytes_of(&body["otsFile"]), garbage);
}

#[tokio::test]
async fn test_upgrade_corrupt_stream_is_protocol_error() {
    let mut proof = MAGIC.to_vec();
    proof.push(VERSION);
    // calendar record claiming a 200-byte URL, then nothing
    proof.extend_from_slice(&[0x00, 200, b'h', b't']);

    let app = TestApp::new().router();
    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": proof })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PROTOCOL_ERROR");
    assert_eq!(body["recoverable"], false);
}

#[tokio::test]
async fn test_upgrade_rejects_bad_byte_arrays() {
    for bad in [
        json!({ "otsFile": [0, 256] }),
        json!({ "otsFile": [-1] }),
        json!({ "otsFile": "AE9wZW5UaW1lc3RhbXBz" }),
        json!({ "otsFile": [] }),
        json!({}),
    ] {
        let app = TestApp::new().router();
        let (status, body) = post_json(app, "/api/upgrade", bad.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {bad}");
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn test_upgrade_rejects_oversized_proof() {
    let big = vec![0u8; 1024 * 1024 + 1];
    let app = TestApp::new().router();

    let (status, body) = post_json(app, "/api/upgrade", json!({ "otsFile": big })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}
