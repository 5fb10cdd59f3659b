use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LOG_FILTER: &str = "api_server=info,shared=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Process-level settings for the HTTP server. Provider settings live in
/// [`shared::config::Settings`] and are loaded lazily.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Blank or whitespace-only values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            bind_addr: non_blank("API_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_filter: non_blank("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_format: parse_log_format(non_blank("LOG_FORMAT").as_deref()),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|err| format!("invalid API_BIND_ADDR '{}': {err}", self.bind_addr))
    }
}

fn parse_log_format(raw: Option<&str>) -> LogFormat {
    match raw {
        Some(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}
