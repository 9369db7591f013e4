//! In-process stand-in for the Telegram Bot API.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::{Path, State},
        http::StatusCode,
        routing::get,
    },
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Method name -> queue of responses; the last one repeats.
    responses: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

pub(crate) struct MockTelegramApi {
    addr: SocketAddr,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

fn ok(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}

fn sent_message(chat_id: &Value) -> Value {
    ok(json!({
        "message_id": 1,
        "date": 0,
        "chat": { "id": chat_id.as_i64().unwrap_or(42), "type": "supergroup", "title": "Mock" },
        "text": "ok"
    }))
}

async fn api_handler(
    State(state): State<MockState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let method = path.rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let chat_id = body.get("chat_id").cloned().unwrap_or(Value::Null);

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(CapturedRequest {
            method: method.clone(),
            body,
        });
    }

    let configured = state.responses.lock().ok().and_then(|mut responses| {
        let queue = responses.get_mut(&method)?;
        if queue.len() > 1 {
            Some(queue.remove(0))
        } else {
            queue.first().cloned()
        }
    });
    if let Some(response) = configured {
        return Json(response);
    }

    Json(match method.as_str() {
        "SendMessage" | "SendPhoto" => sent_message(&chat_id),
        "DeleteWebhook" | "BanChatMember" => ok(json!(true)),
        "GetUpdates" => ok(json!([])),
        _ => json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: user not found"
        }),
    })
}

async fn file_handler(
    State(state): State<MockState>,
    Path(path): Path<String>,
) -> (StatusCode, Vec<u8>) {
    let file = state
        .files
        .lock()
        .ok()
        .and_then(|files| files.get(&path).cloned());
    match file {
        Some(bytes) => (StatusCode::OK, bytes),
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/{*path}", get(file_handler).post(api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        }
    }

    /// Answer `method` with `result` wrapped in a successful envelope.
    pub fn respond(self, method: &str, result: Value) -> Self {
        self.push_response(method, ok(result));
        self
    }

    /// Answer `method` with a Bot API error.
    pub fn fail(self, method: &str, description: &str) -> Self {
        self.push_response(
            method,
            json!({ "ok": false, "error_code": 400, "description": description }),
        );
        self
    }

    /// Queue several envelopes for `method`; the last one keeps repeating.
    pub fn respond_sequence(self, method: &str, results: Vec<Value>) -> Self {
        for result in results {
            self.push_response(method, ok(result));
        }
        self
    }

    /// Serve `bytes` for `GET /{path}`.
    pub fn serve_file(self, path: &str, bytes: &[u8]) -> Self {
        self.state
            .files
            .lock()
            .expect("files lock")
            .insert(path.to_string(), bytes.to_vec());
        self
    }

    fn push_response(&self, method: &str, envelope: Value) {
        self.state
            .responses
            .lock()
            .expect("responses lock")
            .entry(method.to_string())
            .or_default()
            .push(envelope);
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn bot(&self) -> teloxide::Bot {
        let api_url = reqwest::Url::parse(&self.base_url()).expect("parse api url");
        teloxide::Bot::new("test-token").set_api_url(api_url)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    /// JSON bodies of every call to `method`.
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.body)
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.expect("server join");
        }
    }
}
