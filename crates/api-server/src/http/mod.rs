use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use shared::agent::GiftAgentProvider;
use shared::config::SettingsProvider;
use tower_http::catch_panic::CatchPanicLayer;

mod cors;
mod errors;
mod health;
mod observability;
mod suggest;

pub use cors::CorsPolicy;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsProvider>,
    pub agent: Arc<GiftAgentProvider>,
}

impl AppState {
    /// State whose agent reads provider settings from `settings`.
    pub fn from_settings(settings: Arc<SettingsProvider>) -> Self {
        Self {
            agent: Arc::new(GiftAgentProvider::new(settings.clone())),
            settings,
        }
    }
}

pub fn build_router(app_state: AppState, cors_policy: &CorsPolicy) -> Router {
    let routes = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/suggest-gift", post(suggest::suggest_gift))
        .fallback(errors::not_found)
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(errors::panic_response));

    observability::with_request_tracing(routes).layer(cors_policy.layer())
}
