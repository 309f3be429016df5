//! Stub OpenCode server shared by the integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bridge::config::BackendConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the stub answers to message posts.
#[derive(Clone)]
pub enum MessageReply {
    Json(Value),
    Status(StatusCode),
}

#[derive(Default)]
pub struct Recorded {
    pub session_titles: Vec<String>,
    /// (session id, request body)
    pub messages: Vec<(String, Value)>,
}

#[derive(Clone)]
struct StubState {
    recorded: Arc<Mutex<Recorded>>,
    session_reply: Arc<Mutex<MessageReply>>,
    message_reply: Arc<Mutex<MessageReply>>,
    message_delay: Arc<Mutex<Duration>>,
}

pub struct StubOpencode {
    pub addr: SocketAddr,
    pub recorded: Arc<Mutex<Recorded>>,
    session_reply: Arc<Mutex<MessageReply>>,
    message_reply: Arc<Mutex<MessageReply>>,
    message_delay: Arc<Mutex<Duration>>,
}

impl StubOpencode {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url(),
            request_timeout_secs: 5,
            ..BackendConfig::default()
        }
    }

    pub fn set_session_reply(&self, reply: MessageReply) {
        *self.session_reply.lock().unwrap() = reply;
    }

    pub fn set_message_reply(&self, reply: MessageReply) {
        *self.message_reply.lock().unwrap() = reply;
    }

    /// Hold every message response for `delay` (agent turns can take minutes).
    pub fn set_message_delay(&self, delay: Duration) {
        *self.message_delay.lock().unwrap() = delay;
    }

    pub fn sessions_created(&self) -> usize {
        self.recorded.lock().unwrap().session_titles.len()
    }

    pub fn messages(&self) -> Vec<(String, Value)> {
        self.recorded.lock().unwrap().messages.clone()
    }
}

fn respond(reply: &MessageReply) -> (StatusCode, Json<Value>) {
    match reply {
        MessageReply::Json(v) => (StatusCode::OK, Json(v.clone())),
        MessageReply::Status(s) => (*s, Json(json!({ "error": "stub failure" }))),
    }
}

async fn create_session(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = {
        let mut rec = state.recorded.lock().unwrap();
        rec.session_titles
            .push(body["title"].as_str().unwrap_or_default().to_string());
        rec.session_titles.len()
    };
    let reply = state.session_reply.lock().unwrap().clone();
    match reply {
        MessageReply::Json(Value::Null) => (StatusCode::OK, Json(json!({ "id": format!("ses_{}", n) }))),
        other => respond(&other),
    }
}

async fn post_message(
    State(state): State<StubState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.recorded.lock().unwrap().messages.push((id, body));
    let delay = *state.message_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let reply = state.message_reply.lock().unwrap().clone();
    respond(&reply)
}

/// Start the stub on a free local port. Sessions get ids ses_1, ses_2, ...;
/// messages are answered with a single "pong" text part until changed.
pub async fn spawn_opencode() -> StubOpencode {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let session_reply = Arc::new(Mutex::new(MessageReply::Json(Value::Null)));
    let message_reply = Arc::new(Mutex::new(MessageReply::Json(json!({
        "info": { "id": "msg_1" },
        "parts": [{ "type": "step-start" }, { "type": "text", "text": "pong" }]
    }))));
    let message_delay = Arc::new(Mutex::new(Duration::ZERO));
    let state = StubState {
        recorded: recorded.clone(),
        session_reply: session_reply.clone(),
        message_reply: message_reply.clone(),
        message_delay: message_delay.clone(),
    };
    let app = Router::new()
        .route("/session", post(create_session))
        .route("/session/:id/message", post(post_message))
        .with_state(state);
    let addr = serve(app).await;
    StubOpencode {
        addr,
        recorded,
        session_reply,
        message_reply,
        message_delay,
    }
}

/// Serve `app` on 127.0.0.1 with an OS-assigned port; the task runs until the test ends.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Wait until `done` holds, checking every 20ms; panics after `limit`.
pub async fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + limit;
    while !done() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            limit
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
