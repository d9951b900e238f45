//! Test fixtures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use merkle_stamp::anchoring::bitcoin::{ConfirmationTracker, TipSource};
use merkle_stamp::anchoring::ots::{Attestation, OtsConfig, OtsProof};
use merkle_stamp::anchoring::AnchorError;
use merkle_stamp::api::{create_router, AppState};
use merkle_stamp::cache::TtlCache;
use merkle_stamp::config::Environment;
use merkle_stamp::proxy::TimestampProxy;

/// Port nothing listens on
pub const DEAD_URL: &str = "http://127.0.0.1:1";

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Tip source with a settable answer; `None` fails every call
pub struct FakeTip {
    height: Mutex<Option<u64>>,
    calls: AtomicUsize,
}

impl FakeTip {
    pub fn at(height: u64) -> Arc<Self> {
        Arc::new(Self {
            height: Mutex::new(Some(height)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self {
            height: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, height: Option<u64>) {
        *self.height.lock().unwrap() = height;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TipSource for FakeTip {
    fn name(&self) -> &str {
        "fake"
    }

    async fn tip_height(&self) -> Result<u64, AnchorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let height = *self.height.lock().unwrap();
        height.ok_or_else(|| AnchorError::Network("fake source down".into()))
    }
}

/// Builder for test application state
pub struct TestApp {
    pub pools: Vec<String>,
    pub calendars: Vec<String>,
    pub tip: Arc<FakeTip>,
    pub environment: Environment,
    pub quorum: usize,
    pub tip_cache_ttl: Duration,
    pub source_timeout: Duration,
    pub request_timeout: Duration,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            pools: vec![DEAD_URL.to_string()],
            calendars: vec![DEAD_URL.to_string()],
            tip: FakeTip::down(),
            environment: Environment::Development,
            quorum: 2,
            tip_cache_ttl: Duration::from_secs(30),
            source_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(20),
        }
    }

    pub fn pools(mut self, urls: Vec<String>) -> Self {
        self.pools = urls;
        self
    }

    pub fn calendars(mut self, urls: Vec<String>) -> Self {
        self.calendars = urls;
        self
    }

    pub fn tip(mut self, tip: Arc<FakeTip>) -> Self {
        self.tip = tip;
        self
    }

    pub fn tip_cache_ttl(mut self, ttl: Duration) -> Self {
        self.tip_cache_ttl = ttl;
        self
    }

    pub fn timeouts(mut self, source: Duration, request: Duration) -> Self {
        self.source_timeout = source;
        self.request_timeout = request;
        self
    }

    pub fn production(mut self) -> Self {
        self.environment = Environment::Production;
        self
    }

    pub fn state(&self) -> Arc<AppState> {
        let ots = OtsConfig {
            pool_urls: self.pools.clone(),
            calendar_urls: self.calendars.clone(),
            quorum: self.quorum,
            source_timeout: self.source_timeout,
            request_timeout: self.request_timeout,
        };

        let tracker = ConfirmationTracker::new(
            vec![self.tip.clone() as Arc<dyn TipSource>],
            Arc::new(TtlCache::new(self.tip_cache_ttl)),
            Duration::from_secs(1),
        );

        Arc::new(AppState {
            proxy: Arc::new(TimestampProxy::new(&ots).expect("proxy")),
            tracker: Arc::new(tracker),
            health_cache: Arc::new(TtlCache::new(Duration::from_secs(10))),
            environment: self.environment,
            min_confirmations: 3,
        })
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.state())
    }

    /// Serve the router on an ephemeral port; returns the base URL
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

/// Upstream that accepts connections and never answers
pub async fn hanging_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// Upstream that answers every request with `body` after `delay`
pub async fn delayed_upstream(body: Vec<u8>, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = Arc::new(body);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                tokio::time::sleep(delay).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/vnd.opentimestamps.v1\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// Complete proof holding one pending attestation
pub fn pending_proof(calendar_url: &str, commitment: &[u8; 32]) -> Vec<u8> {
    OtsProof::new(vec![Attestation::Calendar {
        url: calendar_url.to_string(),
        commitment: *commitment,
    }])
    .to_bytes()
    .expect("serialize proof")
}

/// Bare Bitcoin attestation record, as a calendar returns it
pub fn bitcoin_stream(height: u64) -> Vec<u8> {
    let mut out = Vec::new();
    Attestation::BitcoinBlock {
        height,
        merkle_root: sha256(&height.to_le_bytes()),
    }
    .write(&mut out)
    .expect("serialize attestation");
    out
}

pub async fn post_json(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Decode a JSON number array into bytes
pub fn bytes_of(value: &Value) -> Vec<u8> {
    value
        .as_array()
        .expect("byte array")
        .iter()
        .map(|v| u8::try_from(v.as_u64().expect("number")).expect("byte"))
        .collect()
}
