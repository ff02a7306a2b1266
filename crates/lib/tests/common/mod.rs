//! Local HTTP fakes for the Ollama and Telegram Bot APIs.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_TOKEN: &str = "TEST";

/// True when a token in the environment would override the test token in `Config`.
pub fn env_token_set() -> bool {
    ["TELEGRAM_BOT_TOKEN", "TG_TOKEN"]
        .iter()
        .any(|name| std::env::var(name).map_or(false, |v| !v.trim().is_empty()))
}

/// Serve `app` on a free loopback port. The server task is left running when the test ends.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// What the fake Ollama answers to /api/generate.
#[derive(Clone)]
pub enum OllamaScript {
    /// NDJSON body returned with 200.
    Body(String),
    /// Status and plain body.
    Status(StatusCode, String),
}

impl OllamaScript {
    /// A well-formed stream: one line per fragment, then a done line.
    pub fn fragments(fragments: &[&str]) -> Self {
        let mut body = String::new();
        for f in fragments {
            body.push_str(&json!({ "model": "m", "response": f, "done": false }).to_string());
            body.push('\n');
        }
        body.push_str(&json!({ "model": "m", "response": "", "done": true }).to_string());
        body.push('\n');
        OllamaScript::Body(body)
    }
}

#[derive(Clone)]
pub struct FakeOllama {
    pub script: OllamaScript,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeOllama {
    pub fn new(script: OllamaScript) -> Self {
        Self {
            script,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn start(&self) -> SocketAddr {
        let app = Router::new()
            .route("/api/generate", post(ollama_generate))
            .route("/api/tags", get(ollama_tags))
            .with_state(self.clone());
        serve(app).await
    }
}

async fn ollama_generate(State(fake): State<FakeOllama>, Json(body): Json<Value>) -> Response {
    fake.requests.lock().unwrap().push(body);
    match fake.script {
        OllamaScript::Body(body) => body.into_response(),
        OllamaScript::Status(status, body) => (status, body).into_response(),
    }
}

async fn ollama_tags() -> Json<Value> {
    Json(json!({ "models": [ { "name": "llama3.1:8b", "size": 4920753328u64 } ] }))
}

/// Fake Telegram Bot API for token [`TEST_TOKEN`]: serves queued updates and records sendMessage calls.
#[derive(Clone, Default)]
pub struct FakeTelegram {
    pub pending: Arc<Mutex<Vec<Value>>>,
    pub sent: Arc<Mutex<Vec<(i64, String)>>>,
    pub offsets: Arc<Mutex<Vec<Option<i64>>>>,
}

impl FakeTelegram {
    pub fn with_updates(updates: Vec<Value>) -> Self {
        let fake = Self::default();
        *fake.pending.lock().unwrap() = updates;
        fake
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }

    pub async fn start(&self) -> SocketAddr {
        let base = format!("/bot{}", TEST_TOKEN);
        let app = Router::new()
            .route(&format!("{}/getMe", base), get(telegram_get_me))
            .route(&format!("{}/getUpdates", base), get(telegram_get_updates))
            .route(&format!("{}/sendMessage", base), post(telegram_send_message))
            .with_state(self.clone());
        serve(app).await
    }
}

async fn telegram_get_me() -> Json<Value> {
    Json(json!({
        "ok": true,
        "result": { "id": 1000, "is_bot": true, "first_name": "Llama", "username": "llama_test_bot" }
    }))
}

async fn telegram_get_updates(
    State(fake): State<FakeTelegram>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    let offset = q.get("offset").and_then(|o| o.parse::<i64>().ok());
    fake.offsets.lock().unwrap().push(offset);
    let updates: Vec<Value> = {
        let mut pending = fake.pending.lock().unwrap();
        if let Some(off) = offset {
            pending.retain(|u| u["update_id"].as_i64().unwrap_or(0) >= off);
        }
        pending.clone()
    };
    if updates.is_empty() {
        // Stand-in for the long-poll wait.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Json(json!({ "ok": true, "result": updates }))
}

async fn telegram_send_message(
    State(fake): State<FakeTelegram>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let chat_id = body["chat_id"].as_i64().unwrap_or_default();
    let text = body["text"].as_str().unwrap_or_default().to_string();
    fake.sent.lock().unwrap().push((chat_id, text.clone()));
    Json(json!({
        "ok": true,
        "result": { "message_id": 1, "chat": { "id": chat_id }, "text": text }
    }))
}

/// A Telegram update carrying a text message. `from` is omitted when `sender` is None.
pub fn text_update(update_id: i64, chat_id: i64, sender: Option<&str>, text: &str) -> Value {
    let mut message = json!({
        "message_id": update_id,
        "date": 0,
        "chat": { "id": chat_id, "type": "private" },
        "text": text,
    });
    if let Some(name) = sender {
        message["from"] = json!({ "id": chat_id * 10, "is_bot": false, "first_name": name });
    }
    json!({ "update_id": update_id, "message": message })
}
