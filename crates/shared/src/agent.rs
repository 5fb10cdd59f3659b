use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::{ConfigError, Settings, SettingsProvider};
use crate::llm::{
    EXPECTED_SUGGESTION_COUNT, LlmGateway, LlmGatewayError, OpenRouterGateway,
    OpenRouterGatewayConfig, OutputValidationError, PromptTemplate, StructuredRequest,
    gift_suggestion_template, validate_output_value,
};
use crate::models::AgentResponse;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Upstream(#[from] LlmGatewayError),
    #[error(transparent)]
    InvalidOutput(#[from] OutputValidationError),
}

impl AgentError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Upstream(LlmGatewayError::Timeout) => "upstream_timeout",
            Self::Upstream(_) => "upstream_failure",
            Self::InvalidOutput(_) => "invalid_output",
        }
    }
}

/// Gift suggestion agent: a system prompt and output contract bound to one gateway.
pub struct GiftAgent {
    gateway: Arc<dyn LlmGateway>,
    template: PromptTemplate,
}

impl GiftAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            template: gift_suggestion_template(),
        }
    }

    pub async fn generate(&self, user_message: &str) -> Result<AgentResponse, AgentError> {
        let request = StructuredRequest::from_template(&self.template, user_message);
        let started_at = Instant::now();

        let result = self.gateway.generate(request).await;
        let latency_ms = started_at.elapsed().as_millis() as u64;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!(latency_ms, error = %err, "gift agent provider call failed");
                return Err(err.into());
            }
        };

        let usage = response.usage.clone().unwrap_or_default();
        let output = match validate_output_value(&response.output) {
            Ok(output) => output,
            Err(err) => {
                error!(
                    model = %response.model,
                    provider_request_id = response.provider_request_id.as_deref().unwrap_or("-"),
                    error = %err,
                    "gift agent output rejected by contract"
                );
                return Err(err.into());
            }
        };

        if output.suggestions.len() != EXPECTED_SUGGESTION_COUNT {
            warn!(
                expected = EXPECTED_SUGGESTION_COUNT,
                actual = output.suggestions.len(),
                "gift agent returned an unexpected number of suggestions"
            );
        }

        info!(
            model = %response.model,
            provider_request_id = response.provider_request_id.as_deref().unwrap_or("-"),
            latency_ms,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            suggestions = output.suggestions.len(),
            "generated gift suggestions"
        );

        Ok(output)
    }
}

pub type GatewayFactory =
    Box<dyn Fn(&Settings) -> Result<Arc<dyn LlmGateway>, ConfigError> + Send + Sync>;

/// Lazily builds the [`GiftAgent`] on first use and reuses it for every later request.
pub struct GiftAgentProvider {
    settings: Arc<SettingsProvider>,
    gateway_factory: GatewayFactory,
    agent: OnceCell<GiftAgent>,
}

impl GiftAgentProvider {
    pub fn new(settings: Arc<SettingsProvider>) -> Self {
        Self::with_gateway_factory(settings, openrouter_gateway)
    }

    pub fn with_gateway_factory(
        settings: Arc<SettingsProvider>,
        gateway_factory: impl Fn(&Settings) -> Result<Arc<dyn LlmGateway>, ConfigError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            settings,
            gateway_factory: Box::new(gateway_factory),
            agent: OnceCell::new(),
        }
    }

    pub async fn agent(&self) -> Result<&GiftAgent, AgentError> {
        self.agent
            .get_or_try_init(|| async {
                let settings = self.settings.get_settings().await.map_err(|err| {
                    error!(error = %err, "failed to load settings for gift agent");
                    err
                })?;
                let gateway = (self.gateway_factory)(&settings)?;
                info!(model = %settings.model_name, "gift suggestion agent initialized");
                Ok::<_, AgentError>(GiftAgent::new(gateway))
            })
            .await
    }

    pub async fn generate(&self, user_message: &str) -> Result<AgentResponse, AgentError> {
        info!(
            message_chars = user_message.chars().count(),
            "processing gift request"
        );
        self.agent().await?.generate(user_message).await
    }
}

impl fmt::Debug for GiftAgentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiftAgentProvider")
            .field("settings", &self.settings)
            .field("agent_initialized", &self.agent.initialized())
            .finish()
    }
}

fn openrouter_gateway(settings: &Settings) -> Result<Arc<dyn LlmGateway>, ConfigError> {
    let gateway = OpenRouterGateway::new(OpenRouterGatewayConfig::from_settings(settings))?;
    Ok(Arc::new(gateway))
}
