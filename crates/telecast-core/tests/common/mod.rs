#![allow(dead_code, unused_macros)]

//! Throwaway HTTP stubs for the catalog and video-platform endpoints,
//! bound to ephemeral localhost ports so the real reqwest client is
//! exercised end to end.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use telecast_core::Config;

#[derive(Clone)]
pub struct StubApi {
    pub channels_body: Arc<Mutex<String>>,
    pub channels_status: Arc<Mutex<u16>>,
    pub search_body: Arc<Mutex<String>>,
    pub search_status: Arc<Mutex<u16>>,
    pub videos_body: Arc<Mutex<String>>,
    pub videos_status: Arc<Mutex<u16>>,
    pub videos_calls: Arc<AtomicUsize>,
}

impl StubApi {
    fn new() -> Self {
        Self {
            channels_body: Arc::new(Mutex::new("[]".to_string())),
            channels_status: Arc::new(Mutex::new(200)),
            search_body: Arc::new(Mutex::new("[]".to_string())),
            search_status: Arc::new(Mutex::new(200)),
            videos_body: Arc::new(Mutex::new(r#"{"items": []}"#.to_string())),
            videos_status: Arc::new(Mutex::new(200)),
            videos_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_channels(&self, body: &str) {
        *self.channels_body.lock().unwrap() = body.to_string();
    }

    pub fn set_channels_status(&self, status: u16) {
        *self.channels_status.lock().unwrap() = status;
    }

    pub fn set_search(&self, body: &str) {
        *self.search_body.lock().unwrap() = body.to_string();
    }

    pub fn set_search_status(&self, status: u16) {
        *self.search_status.lock().unwrap() = status;
    }

    pub fn set_videos(&self, body: &str) {
        *self.videos_body.lock().unwrap() = body.to_string();
    }

    pub fn set_videos_status(&self, status: u16) {
        *self.videos_status.lock().unwrap() = status;
    }

    pub fn videos_calls(&self) -> usize {
        self.videos_calls.load(Ordering::Acquire)
    }
}

fn respond(status: u16, body: String) -> impl IntoResponse {
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn channels_handler(State(api): State<StubApi>) -> impl IntoResponse {
    let status = *api.channels_status.lock().unwrap();
    let body = api.channels_body.lock().unwrap().clone();
    respond(status, body)
}

async fn search_handler(State(api): State<StubApi>) -> impl IntoResponse {
    let status = *api.search_status.lock().unwrap();
    let body = api.search_body.lock().unwrap().clone();
    respond(status, body)
}

async fn videos_handler(State(api): State<StubApi>) -> impl IntoResponse {
    api.videos_calls.fetch_add(1, Ordering::AcqRel);
    let status = *api.videos_status.lock().unwrap();
    let body = api.videos_body.lock().unwrap().clone();
    respond(status, body)
}

/// Bind the stub on an ephemeral port. Returns the shared handles and the
/// server's base URL.
pub async fn spawn_stub() -> (StubApi, String) {
    let api = StubApi::new();
    let app = Router::new()
        .route("/api/channels", get(channels_handler))
        .route("/api/channels/search", get(search_handler))
        .route("/videos", get(videos_handler))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    (api, format!("http://{}", addr))
}

/// Config pointed at a stub server, with a fast poll period for tests.
pub fn test_config(base: &str, api_key: Option<&str>, poll_interval_ms: u64) -> Config {
    Config {
        api_base: format!("{}/api", base),
        videos_api_base: base.to_string(),
        youtube_api_key: api_key.map(|k| k.to_string()),
        poll_interval_ms,
        ..Config::default()
    }
}

/// An address nothing listens on, for connection-refused scenarios.
pub async fn unreachable_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe local addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Re-evaluate `$cond` every 25 ms until it holds or `$timeout_ms` elapses;
/// yields whether the condition passed. `$cond` may `.await`.
macro_rules! wait_until {
    ($timeout_ms:expr, $cond:expr) => {{
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis($timeout_ms);
        loop {
            if $cond {
                break true;
            }
            if std::time::Instant::now() >= deadline {
                break false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
    }};
}
