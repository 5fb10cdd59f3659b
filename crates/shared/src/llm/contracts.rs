use schemars::r#gen::SchemaSettings;
use serde_json::Value;
use thiserror::Error;

use crate::models::AgentResponse;

pub const GIFT_SUGGESTIONS_SCHEMA_NAME: &str = "gift_suggestions";

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("output contract payload is invalid: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("output contract field {field} must not be blank")]
    BlankField { field: String },
}

/// Self-contained JSON schema for [`AgentResponse`], with subschemas inlined so it can be sent
/// to the provider as a structured output contract.
pub fn output_schema() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<AgentResponse>();

    serde_json::to_value(schema).expect("gift suggestions schema should be serializable")
}

pub fn parse_contract(payload: Value) -> Result<AgentResponse, ContractError> {
    let response: AgentResponse = serde_json::from_value(payload)?;
    ensure_populated(&response)?;
    Ok(response)
}

fn ensure_populated(response: &AgentResponse) -> Result<(), ContractError> {
    for (index, suggestion) in response.suggestions.iter().enumerate() {
        let fields = [
            ("gift_name", suggestion.gift_name.as_str()),
            ("reason", suggestion.reason.as_str()),
            ("price_range", suggestion.price_range.as_str()),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ContractError::BlankField {
                    field: format!("suggestions[{index}].{name}"),
                });
            }
        }

        for (store_index, store) in suggestion.where_to_buy.iter().enumerate() {
            if store.trim().is_empty() {
                return Err(ContractError::BlankField {
                    field: format!("suggestions[{index}].where_to_buy[{store_index}]"),
                });
            }
        }
    }

    Ok(())
}
