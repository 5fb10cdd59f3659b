use axum::http::HeaderValue;
use shared::config::SettingsProvider;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

const WILDCARD_ORIGIN: &str = "*";

/// Cross-origin policy, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Only the listed origins, with credentials.
    Strict(Vec<String>),
    /// Any origin, echoed back with credentials allowed. Used when settings cannot be
    /// loaded or the list contains `*`.
    Permissive,
}

impl CorsPolicy {
    pub async fn resolve(settings: &SettingsProvider) -> Self {
        match settings.get_settings().await {
            Ok(settings) => {
                let policy = Self::from_origins(&settings.cors_origins);
                info!(cors_origins = ?settings.cors_origins, "cors policy resolved from settings");
                policy
            }
            Err(err) => {
                warn!(error = %err, "failed to load cors settings; allowing all origins");
                Self::Permissive
            }
        }
    }

    pub fn from_origins(origins: &[String]) -> Self {
        if origins.iter().any(|origin| origin == WILDCARD_ORIGIN) {
            return Self::Permissive;
        }
        Self::Strict(origins.to_vec())
    }

    pub fn layer(&self) -> CorsLayer {
        let allow_origin = match self {
            Self::Strict(origins) => AllowOrigin::list(header_values(origins)),
            Self::Permissive => AllowOrigin::mirror_request(),
        };
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }
}

fn header_values(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "skipping cors origin that is not a valid header value");
                None
            }
        })
        .collect()
}
