use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use color_eyre::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::error;

pub const SEARCH_PATH: &str = "/services/rest/";
pub const BROKEN_PATH: &str = "/broken/";
pub const FAILING_PATH: &str = "/failing/";
pub const SLOW_PATH: &str = "/slow/";
pub const SEARCH_TOTAL: u64 = 42;

#[derive(Clone)]
struct FakeState {
    origin: String,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// A local stand-in for the photo search endpoint and its image host.
pub struct FakeFlickr {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    handle: JoinHandle<()>,
}

impl FakeFlickr {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            origin: format!("http://{addr}"),
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route(SEARCH_PATH, get(search))
            .route(BROKEN_PATH, get(broken))
            .route(FAILING_PATH, get(failing))
            .route(SLOW_PATH, get(slow))
            .route("/images/{name}", get(image))
            .with_state(state);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Fake search server failed: {e}");
            }
        });

        Ok(Self {
            addr,
            requests,
            handle,
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Query parameters of every search received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FakeFlickr {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The bytes the fake image host serves for `name`.
#[must_use]
pub fn image_bytes(name: &str) -> Vec<u8> {
    format!("jpeg:{name}").into_bytes()
}

fn search_body(origin: &str) -> Value {
    json!({
        "photos": {
            "page": 1,
            "pages": 2,
            "perpage": 21,
            "total": SEARCH_TOTAL.to_string(),
            "photo": [
                { "id": "http-101", "title": "Harbour", "url_m": format!("{origin}/images/http-101.jpg") },
                { "id": "http-102", "title": "", "url_m": format!("{origin}/images/http-102.jpg") },
                { "id": "http-103", "title": "No medium size" }
            ]
        },
        "stat": "ok"
    })
}

async fn search(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(params);
    axum::Json(search_body(&state.origin)).into_response()
}

async fn broken() -> Response {
    "<html>Service Unavailable</html>".into_response()
}

async fn failing() -> Response {
    axum::Json(json!({
        "stat": "fail",
        "code": 100,
        "message": "Invalid API Key (Key has invalid format)"
    }))
    .into_response()
}

async fn slow(State(state): State<FakeState>) -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    axum::Json(search_body(&state.origin)).into_response()
}

async fn image(Path(name): Path<String>) -> Response {
    if name.ends_with(".jpg") {
        image_bytes(&name).into_response()
    } else {
        (StatusCode::NOT_FOUND, "no such image").into_response()
    }
}
