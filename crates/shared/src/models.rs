use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_USER_MESSAGE_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftRequest {
    pub user_message: String,
    #[serde(default)]
    pub context: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("user_message must be at least {min} characters (got {actual})")]
    MessageTooShort { min: usize, actual: usize },
}

impl GiftRequest {
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        let actual = self.user_message.chars().count();
        if actual < MIN_USER_MESSAGE_CHARS {
            return Err(RequestValidationError::MessageTooShort {
                min: MIN_USER_MESSAGE_CHARS,
                actual,
            });
        }
        Ok(())
    }
}

/// One candidate gift recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GiftSuggestion {
    /// Name of the suggested gift
    #[schemars(length(min = 1))]
    pub gift_name: String,
    /// Why this gift suits the recipient
    #[schemars(length(min = 1))]
    pub reason: String,
    /// Approximate price range, e.g. "$40 - $60"
    #[schemars(length(min = 1))]
    pub price_range: String,
    /// Stores or sites where the gift can be purchased
    #[schemars(length(min = 1))]
    pub where_to_buy: Vec<String>,
}

/// Output contract of the gift suggestion agent and body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AgentResponse {
    /// Gift suggestions, best first
    #[schemars(length(min = 1))]
    pub suggestions: Vec<GiftSuggestion>,
    /// Additional notes or tips for the gift giver
    #[serde(default)]
    pub additional_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub config_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
