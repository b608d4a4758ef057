//! Fake Mailgun events API
//!
//! Serves `GET /v3/{domain}/events` on an ephemeral localhost port and
//! records every request it sees. The response is fixed at startup.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One request received by the fake.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub domain: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct FakeState {
    status: StatusCode,
    body: serde_json::Value,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct FakeMailgun {
    port: u16,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeMailgun {
    /// Start a fake answering every events query with `status` and
    /// the JSON `body`.
    pub async fn start(status: StatusCode, body: serde_json::Value) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            status,
            body,
            seen: seen.clone(),
        };

        let app = Router::new()
            .route("/v3/{domain}/events", get(events))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { port, seen, handle }
    }

    /// Base URL to use as `MAILGUN_API_URL`.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for FakeMailgun {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn events(
    State(state): State<FakeState>,
    Path(domain): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    state.seen.lock().unwrap().push(SeenRequest {
        domain,
        query,
        authorization,
    });

    (state.status, Json(state.body))
}
