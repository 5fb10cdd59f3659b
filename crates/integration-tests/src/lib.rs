//! Fixtures shared by the HTTP integration tests: scripted LLM gateways and a mock
//! OpenRouter chat-completions server.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::llm::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayResponse, StructuredRequest,
};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Output(Value),
    Failure(String),
    Panic,
}

/// Gateway that replays one scripted reply for every call and counts calls.
#[derive(Debug)]
pub struct ScriptedGateway {
    reply: ScriptedReply,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(reply: ScriptedReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmGateway for ScriptedGateway {
    fn generate<'a>(&'a self, _request: StructuredRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                ScriptedReply::Output(output) => Ok(LlmGatewayResponse {
                    model: "scripted-model".to_string(),
                    provider_request_id: Some("scripted-request".to_string()),
                    output: output.clone(),
                    usage: None,
                }),
                ScriptedReply::Failure(message) => {
                    Err(LlmGatewayError::ProviderFailure(message.clone()))
                }
                ScriptedReply::Panic => panic!("scripted gateway panic"),
            }
        })
    }
}

pub fn suggestion(gift_name: &str, where_to_buy: &[&str]) -> Value {
    json!({
        "gift_name": gift_name,
        "reason": format!("{gift_name} matches what they love."),
        "price_range": "$40 - $100",
        "where_to_buy": where_to_buy,
    })
}

pub fn three_suggestions() -> Value {
    json!({
        "suggestions": [
            suggestion("Compact travel tripod", &["B&H Photo", "Amazon"]),
            suggestion("Waterproof hiking daypack", &["REI", "Backcountry"]),
            suggestion("National park photo guide", &["Barnes & Noble", "Bookshop.org"]),
        ],
        "additional_notes": "Pair any of these with a handwritten trail map."
    })
}

#[derive(Debug, Clone)]
pub struct MockUpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

impl MockUpstreamReply {
    pub fn completion(content: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({
                "id": "gen-mock",
                "model": "mock-model",
                "choices": [{ "message": { "role": "assistant", "content": content } }],
                "usage": { "prompt_tokens": 120, "completion_tokens": 240, "total_tokens": 360 }
            }),
        }
    }

    pub fn provider_error(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": { "code": code, "message": message } }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockUpstreamState {
    replies: Arc<Mutex<VecDeque<MockUpstreamReply>>>,
    pub seen_payloads: Arc<Mutex<Vec<Value>>>,
    pub seen_auth_headers: Arc<Mutex<Vec<String>>>,
}

/// A running mock of the OpenRouter chat-completions endpoint.
pub struct MockUpstream {
    pub url: String,
    pub state: MockUpstreamState,
    shutdown_tx: oneshot::Sender<()>,
    server_task: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start(replies: Vec<MockUpstreamReply>) -> Self {
        let state = MockUpstreamState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..MockUpstreamState::default()
        };
        let app = Router::new()
            .route("/api/v1/chat/completions", post(mock_chat_completions))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let local_addr = listener
            .local_addr()
            .expect("listener address should resolve");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("mock upstream should run");
        });

        Self {
            url: format!("http://{local_addr}/api/v1/chat/completions"),
            state,
            shutdown_tx,
            server_task,
        }
    }

    pub async fn request_count(&self) -> usize {
        self.state.seen_payloads.lock().await.len()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        self.server_task.await.expect("mock upstream should join");
    }
}

async fn mock_chat_completions(
    State(state): State<MockUpstreamState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen_payloads.lock().await.push(payload);
    if let Some(value) = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        state.seen_auth_headers.lock().await.push(value.to_string());
    }

    let reply = state.replies.lock().await.pop_front().unwrap_or_else(|| {
        MockUpstreamReply::provider_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "exhausted_test_replies",
            "no scripted reply left",
        )
    });

    (reply.status, Json(reply.body))
}
