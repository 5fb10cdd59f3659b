use serde_json::Value;

use super::contracts::{GIFT_SUGGESTIONS_SCHEMA_NAME, output_schema};

pub const GIFT_SUGGESTION_SYSTEM_PROMPT: &str = "\
You are a helpful gift suggestion assistant. When users describe someone they need a gift for, \
analyze their description and suggest exactly 3 thoughtful, personalized gift ideas.

Consider the person's:
- Interests and hobbies
- Age and life stage
- Relationship to the gift giver
- Any mentioned preferences or constraints
- Budget if specified

For each suggestion, provide:
1. The gift name
2. A clear reason why this gift suits the person, tied to what you were told about them
3. A realistic price range
4. 2-3 places where it can be purchased

Be creative but practical. Suggest gifts that show thoughtfulness and consideration. \
Respond only with JSON matching the provided schema.";

pub const EXPECTED_SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system_prompt: &'static str,
    pub schema_name: &'static str,
    pub output_schema: Value,
}

pub fn gift_suggestion_template() -> PromptTemplate {
    PromptTemplate {
        system_prompt: GIFT_SUGGESTION_SYSTEM_PROMPT,
        schema_name: GIFT_SUGGESTIONS_SCHEMA_NAME,
        output_schema: output_schema(),
    }
}
