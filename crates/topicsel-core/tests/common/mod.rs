//! In-process mock backend for integration tests.
//!
//! Binds an ephemeral localhost port, records every request it receives and
//! answers with canned replies keyed by path. Unknown paths get a 404.

// Allow dead code: each test binary uses a different subset
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<HashMap<String, Reply>>,
}

pub struct MockBackend {
    state: Arc<MockState>,
    endpoint: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let local_addr = listener.local_addr().expect("mock backend address");

        let app = Router::new().fallback(handle).with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            state,
            endpoint: format!("http://{}", local_addr),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Base URL for a partition mounted under `prefix`, e.g. `/api`.
    pub fn base_url(&self, prefix: &str) -> String {
        format!("{}{}", self.endpoint, prefix)
    }

    pub fn reply(&self, path: &str, status: u16, body: Value) {
        self.insert(path, status, body, None);
    }

    /// Envelope reply with HTTP 200.
    pub fn reply_envelope(&self, path: &str, code: i64, data: Value, message: &str) {
        self.reply(path, 200, json!({ "code": code, "data": data, "message": message }));
    }

    pub fn reply_after(&self, path: &str, delay: Duration, body: Value) {
        self.insert(path, 200, body, Some(delay));
    }

    fn insert(&self, path: &str, status: u16, body: Value, delay: Option<Duration>) {
        let reply = Reply {
            status: StatusCode::from_u16(status).expect("valid status"),
            body,
            delay,
        };
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("backend received no requests")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        headers: headers.clone(),
        body: serde_json::from_slice(&body).ok(),
    };
    state.requests.lock().unwrap().push(recorded);

    let reply = state.replies.lock().unwrap().get(&path).cloned();
    let Some(reply) = reply else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": 404, "data": null, "message": "no such endpoint" })),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, Json(reply.body)).into_response()
}

/// An address nothing listens on, for connection-refused tests.
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener address");
    drop(listener);
    format!("http://{}", addr)
}
