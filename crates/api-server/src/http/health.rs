use axum::Json;
use axum::extract::State;
use shared::models::HealthResponse;
use tracing::warn;

use super::AppState;

const HEALTHY: &str = "healthy";
const INCOMPLETE_CONFIG_WARNING: &str = "Configuration may be incomplete";

/// Always reports healthy; configuration problems degrade the payload, not the status.
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.settings.get_settings().await {
        Ok(settings) => Json(HealthResponse {
            status: HEALTHY.to_string(),
            config_loaded: true,
            cors_origins: Some(settings.cors_origins.clone()),
            warning: None,
        }),
        Err(err) => {
            warn!(error = %err, "health check: settings not fully loaded");
            Json(HealthResponse {
                status: HEALTHY.to_string(),
                config_loaded: false,
                cors_origins: None,
                warning: Some(INCOMPLETE_CONFIG_WARNING.to_string()),
            })
        }
    }
}
