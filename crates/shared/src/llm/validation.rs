use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use super::contracts::{ContractError, output_schema, parse_contract};
use crate::models::AgentResponse;

#[derive(Debug, Error)]
pub enum OutputValidationError {
    #[error("agent output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("agent output schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("agent output failed schema validation: {errors:?}")]
    SchemaViolation { errors: Vec<String> },
    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub fn validate_output_json(raw_json: &str) -> Result<AgentResponse, OutputValidationError> {
    let payload: Value = serde_json::from_str(raw_json)?;
    validate_output_value(&payload)
}

pub fn validate_output_value(payload: &Value) -> Result<AgentResponse, OutputValidationError> {
    let validator = AGENT_RESPONSE_VALIDATOR
        .as_ref()
        .map_err(|message| OutputValidationError::SchemaCompile(message.clone()))?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(OutputValidationError::SchemaViolation { errors });
    }

    parse_contract(payload.clone()).map_err(OutputValidationError::from)
}

static AGENT_RESPONSE_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| JSONSchema::compile(&output_schema()).map_err(|err| err.to_string()));
