//! # Prompt Flows
//!
//! Thin wrappers around the hosted model: structured request in, prompt
//! template, exactly one completion, schema-validated structured response
//! out. Requests are checked field-by-field before the model is called;
//! replies that fail validation surface as a terminal [`FlowError`].

pub mod creation;
pub mod linking;
pub mod pricing;
pub mod prompts;
pub mod security;
pub mod tool_code;
pub mod tool_suggestion;

pub use creation::{CreationAssistRequest, CreationAssistResponse};
pub use linking::{LinkingAssistRequest, LinkingAssistResponse};
pub use pricing::{PriceSuggestionRequest, PriceSuggestionResponse};
pub use security::{SecurityAssessRequest, SecurityAssessResponse, SecurityFinding, SecurityVerdict};
pub use tool_code::{ToolCodeRequest, ToolCodeResponse};
pub use tool_suggestion::{ToolSuggestionRequest, ToolSuggestionResponse};

use crate::error::FlowError;
use crate::llm::{extract_json, ChatClient};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Run one flow exchange: append the output schema to the user message,
/// call the model once, and decode the reply as `T`.
pub(crate) async fn invoke<T>(
    client: &dyn ChatClient,
    system: &str,
    user: &str,
) -> Result<T, FlowError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = serde_json::to_string(&schemars::schema_for!(T))
        .map_err(|e| FlowError::Schema(e.to_string()))?;
    let user = format!(
        "{user}\n\nRespond with a single JSON object matching this schema, and nothing else:\n{schema}"
    );
    let reply = client.complete(system, &user).await?;
    let payload = extract_json(&reply);
    serde_json::from_str(payload).map_err(|e| FlowError::Schema(e.to_string()))
}
