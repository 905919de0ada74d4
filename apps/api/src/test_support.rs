//! Local stand-in for the Anthropic Messages API and S3, for in-process tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

#[derive(Clone)]
struct StubState {
    replies: Arc<Vec<(u16, Value)>>,
    llm_hits: Arc<AtomicUsize>,
    s3_requests: Arc<Mutex<Vec<String>>>,
}

pub struct Stub {
    pub base_url: String,
    state: StubState,
}

impl Stub {
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    pub fn llm_hits(&self) -> usize {
        self.state.llm_hits.load(Ordering::SeqCst)
    }

    /// `"{METHOD} {path}"` of every non-LLM request, in arrival order.
    pub fn s3_requests(&self) -> Vec<String> {
        self.state.s3_requests.lock().unwrap().clone()
    }
}

/// Serves `replies` in order on `POST /v1/messages` (the last one repeats)
/// and answers every other request with an empty 200, like a bucket would.
pub async fn spawn_stub(replies: Vec<(u16, Value)>) -> Stub {
    let state = StubState {
        replies: Arc::new(replies),
        llm_hits: Arc::new(AtomicUsize::new(0)),
        s3_requests: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/v1/messages", post(reply))
        .fallback(record_object_request)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Stub {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn reply(State(state): State<StubState>) -> (StatusCode, Json<Value>) {
    let n = state.llm_hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = state
        .replies
        .get(n)
        .or_else(|| state.replies.last())
        .cloned()
        .unwrap_or((500, json!({})));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}

async fn record_object_request(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
) -> StatusCode {
    state
        .s3_requests
        .lock()
        .unwrap()
        .push(format!("{method} {}", uri.path()));
    StatusCode::OK
}

/// Messages API success body whose only text block is `text`.
pub fn message(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 10, "output_tokens": 20}
    })
}

/// Messages API error body.
pub fn api_error(message: &str) -> Value {
    json!({"type": "error", "error": {"type": "api_error", "message": message}})
}
