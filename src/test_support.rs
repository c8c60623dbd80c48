//! In-process stand-in for a Prometheus server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

const EMPTY_VECTOR: &str = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
const EMPTY_MATRIX: &str = r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub params: HashMap<String, String>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RecordedCall>,
    canned: Option<(u16, String)>,
}

pub struct FakePrometheus {
    addr: std::net::SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakePrometheus {
    /// Answers every query with an empty successful result until
    /// [`FakePrometheus::respond_with`] is called.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        self.state.lock().unwrap().canned = Some((status, body.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<FakeState>>>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    let path = uri.path().to_string();
    let (status, body) = state.canned.clone().unwrap_or_else(|| {
        let body = if path.ends_with("query_range") {
            EMPTY_MATRIX
        } else {
            EMPTY_VECTOR
        };
        (200, body.to_string())
    });
    state.calls.push(RecordedCall { path, params });

    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// A local address with nothing listening on it.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
