#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use api_server::http::{AppState, CorsPolicy, build_router};
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::{Value, json};
use shared::agent::GiftAgentProvider;
use shared::config::{ConfigError, Settings, SettingsProvider};
use shared::llm::LlmGateway;
use tower::ServiceExt;

pub struct TestApp {
    pub router: axum::Router,
    pub gateway_builds: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn gateway_builds(&self) -> usize {
        self.gateway_builds.load(Ordering::SeqCst)
    }
}

/// Router whose agent is backed by `gateway` and whose settings always load.
pub fn build_test_app(gateway: Arc<dyn LlmGateway>) -> TestApp {
    build_test_app_with_settings(
        SettingsProvider::fixed(Settings::with_api_key("sk-test")),
        gateway,
    )
}

pub fn build_test_app_with_settings(
    settings: SettingsProvider,
    gateway: Arc<dyn LlmGateway>,
) -> TestApp {
    let settings = Arc::new(settings);
    let gateway_builds = Arc::new(AtomicUsize::new(0));
    let counter = gateway_builds.clone();
    let agent = GiftAgentProvider::with_gateway_factory(settings.clone(), move |_settings| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(gateway.clone())
    });

    let state = AppState {
        settings,
        agent: Arc::new(agent),
    };
    TestApp {
        router: build_router(state, &CorsPolicy::Strict(vec!["http://localhost:3000".to_string()])),
        gateway_builds,
    }
}

pub fn missing_api_key_settings() -> SettingsProvider {
    SettingsProvider::with_loader(|| Settings::from_lookup(|_key| None::<String>))
}

/// Settings whose first load fails and every later load succeeds.
pub fn settings_failing_first_load() -> SettingsProvider {
    let attempts = AtomicUsize::new(0);
    SettingsProvider::with_loader(move || {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ConfigError::MissingVar("OPENROUTER_API_KEY".to_string()));
        }
        Ok(Settings::with_api_key("sk-test"))
    })
}

pub struct JsonResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send_json(app: &axum::Router, request: Request<Body>) -> JsonResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should succeed");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should read");
    let body = serde_json::from_slice::<Value>(&body).unwrap_or_else(|_| json!({}));

    JsonResponse {
        status,
        headers,
        body,
    }
}

pub fn request(method: Method, uri: &str, json_body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    match json_body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    }
}

pub fn suggest_request(user_message: &str) -> Request<Body> {
    request(
        Method::POST,
        "/api/suggest-gift",
        Some(json!({ "user_message": user_message })),
    )
}

pub fn detail(body: &Value) -> Option<&str> {
    body.get("detail").and_then(Value::as_str)
}
