use std::env;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config_env::{
    Lookup, optional_trimmed, parse_origin_list_env, parse_u64, require_non_empty,
};

pub use crate::config_env::parse_origin_list;

pub const DEFAULT_MODEL_NAME: &str = "meta-llama/llama-3.3-70b-instruct:free";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000"];
pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub openrouter_api_key: String,
    pub model_name: String,
    pub cors_origins: Vec<String>,
    pub chat_completions_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {key}: {value}")]
    ParseInt { key: String, value: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build OpenRouter http client: {0}")]
    HttpClient(String),
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup: Lookup<'_> = &lookup;

        let chat_completions_url = optional_trimmed(lookup, "OPENROUTER_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        if !chat_completions_url.starts_with("http://")
            && !chat_completions_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidConfiguration(
                "OPENROUTER_CHAT_COMPLETIONS_URL must start with http:// or https://".to_string(),
            ));
        }

        let request_timeout_ms =
            parse_u64(lookup, "OPENROUTER_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        if request_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "OPENROUTER_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            openrouter_api_key: require_non_empty(lookup, "OPENROUTER_API_KEY")?,
            model_name: optional_trimmed(lookup, "MODEL_NAME")
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            cors_origins: parse_origin_list_env(lookup, "CORS_ORIGINS", DEFAULT_CORS_ORIGINS),
            chat_completions_url,
            request_timeout_ms,
        })
    }

    /// Settings with defaults for everything except the API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            openrouter_api_key: api_key.into(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS
                .iter()
                .map(|origin| (*origin).to_string())
                .collect(),
            chat_completions_url: DEFAULT_CHAT_COMPLETIONS_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openrouter_api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("cors_origins", &self.cors_origins)
            .field("chat_completions_url", &self.chat_completions_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

type SettingsLoader = Box<dyn Fn() -> Result<Settings, ConfigError> + Send + Sync>;

/// Loads [`Settings`] at most once per process and hands out the cached instance.
///
/// A failed load is not cached: the next caller runs the loader again.
pub struct SettingsProvider {
    loader: SettingsLoader,
    cell: OnceCell<Arc<Settings>>,
}

impl SettingsProvider {
    pub fn from_env() -> Self {
        Self::with_loader(Settings::from_env)
    }

    pub fn with_loader(
        loader: impl Fn() -> Result<Settings, ConfigError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    pub fn fixed(settings: Settings) -> Self {
        Self {
            loader: Box::new(|| {
                Err(ConfigError::InvalidConfiguration(
                    "fixed settings provider has no loader".to_string(),
                ))
            }),
            cell: OnceCell::new_with(Some(Arc::new(settings))),
        }
    }

    pub async fn get_settings(&self) -> Result<Arc<Settings>, ConfigError> {
        self.cell
            .get_or_try_init(|| async { (self.loader)().map(Arc::new) })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

impl fmt::Debug for SettingsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsProvider")
            .field("settings", &self.cell.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{
        ConfigError, DEFAULT_CHAT_COMPLETIONS_URL, DEFAULT_MODEL_NAME, DEFAULT_REQUEST_TIMEOUT_MS,
        Settings, SettingsProvider,
    };

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", " sk-test ")]))
            .expect("settings should load");

        assert_eq!(settings.openrouter_api_key, "sk-test");
        assert_eq!(settings.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(settings.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(settings.chat_completions_url, DEFAULT_CHAT_COMPLETIONS_URL);
        assert_eq!(settings.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("MODEL_NAME", "openai/gpt-4o-mini"),
            ("CORS_ORIGINS", r#"["https://gifts.example","http://localhost:3000"]"#),
            ("OPENROUTER_TIMEOUT_MS", "5000"),
        ]))
        .expect("settings should load");

        assert_eq!(settings.model_name, "openai/gpt-4o-mini");
        assert_eq!(
            settings.cors_origins,
            vec![
                "https://gifts.example".to_string(),
                "http://localhost:3000".to_string()
            ]
        );
        assert_eq!(settings.request_timeout_ms, 5000);
    }

    #[test]
    fn origins_from_list_json_and_csv_agree() {
        let as_list = vec!["http://a".to_string(), "http://b".to_string()];
        let from_json = Settings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("CORS_ORIGINS", r#"["http://a","http://b"]"#),
        ]))
        .expect("json origins should load");
        let from_csv = Settings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("CORS_ORIGINS", "http://a,http://b"),
        ]))
        .expect("csv origins should load");

        assert_eq!(from_json.cors_origins, as_list);
        assert_eq!(from_csv.cors_origins, as_list);
    }

    #[test]
    fn missing_or_blank_api_key_is_a_config_error() {
        let err = Settings::from_lookup(lookup_from(&[])).expect_err("missing key must fail");
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "OPENROUTER_API_KEY"));

        let err = Settings::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "  ")]))
            .expect_err("blank key must fail");
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn rejects_non_http_completions_url_and_zero_timeout() {
        let err = Settings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_CHAT_COMPLETIONS_URL", "ftp://example"),
        ]))
        .expect_err("ftp url must fail");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));

        let err = Settings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_TIMEOUT_MS", "0"),
        ]))
        .expect_err("zero timeout must fail");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", Settings::with_api_key("sk-very-secret"));
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn provider_returns_identical_cached_instance() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let provider = SettingsProvider::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Settings::with_api_key("sk-test"))
        });

        let first = provider.get_settings().await.expect("first load");
        let second = provider.get_settings().await.expect("second load");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(provider.is_loaded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cold_start_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let provider = Arc::new(SettingsProvider::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Settings::with_api_key("sk-test"))
        }));

        let tasks = (0..16)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.get_settings().await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await
                .expect("task should join")
                .expect("settings should load");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let provider = SettingsProvider::with_loader(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ConfigError::MissingVar("OPENROUTER_API_KEY".to_string()))
            } else {
                Ok(Settings::with_api_key("sk-test"))
            }
        });

        assert!(provider.get_settings().await.is_err());
        assert!(!provider.is_loaded());
        assert!(provider.get_settings().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fixed_provider_never_runs_a_loader() {
        let provider = SettingsProvider::fixed(Settings::with_api_key("sk-fixed"));
        let settings = provider.get_settings().await.expect("fixed settings");
        assert_eq!(settings.openrouter_api_key, "sk-fixed");
    }
}
