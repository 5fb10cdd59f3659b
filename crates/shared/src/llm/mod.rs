pub mod contracts;
pub mod gateway;
pub mod openrouter;
pub mod prompts;
pub mod validation;

pub use contracts::{ContractError, GIFT_SUGGESTIONS_SCHEMA_NAME, output_schema, parse_contract};
pub use gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayResponse, LlmTokenUsage,
    StructuredRequest,
};
pub use openrouter::{OpenRouterGateway, OpenRouterGatewayConfig};
pub use prompts::{
    EXPECTED_SUGGESTION_COUNT, GIFT_SUGGESTION_SYSTEM_PROMPT, PromptTemplate,
    gift_suggestion_template,
};
pub use validation::{OutputValidationError, validate_output_json, validate_output_value};
