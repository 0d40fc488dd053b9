//! # Price Suggestion Flow

use super::prompts;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceSuggestionRequest {
    /// Purpose, functionalities, and target use cases of the agent.
    pub agent_description: String,
}

impl PriceSuggestionRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.agent_description.trim().is_empty() {
            return Err(FlowError::InvalidRequest(
                "agentDescription must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceSuggestionResponse {
    /// Suggested monthly price in USD, e.g. 9.99.
    pub suggested_price: f64,
    /// Reasoning based on complexity, value, and similar agents.
    pub justification: String,
}

pub async fn run(
    client: &dyn ChatClient,
    request: &PriceSuggestionRequest,
) -> Result<PriceSuggestionResponse, FlowError> {
    run_with_prompt(client, prompts::PRICE_ADVISOR, request).await
}

pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &PriceSuggestionRequest,
) -> Result<PriceSuggestionResponse, FlowError> {
    request.validate()?;
    let user = format!("Agent Description:\n{}", request.agent_description);
    let response: PriceSuggestionResponse = super::invoke(client, system_prompt, &user).await?;
    if !response.suggested_price.is_finite() || response.suggested_price < 0.0 {
        return Err(FlowError::Schema(format!(
            "suggestedPrice {} must be a non-negative number",
            response.suggested_price
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    fn request() -> PriceSuggestionRequest {
        PriceSuggestionRequest {
            agent_description: "Automates invoice reconciliation".to_string(),
        }
    }

    #[tokio::test]
    async fn test_price_decodes() {
        let client = CannedChatClient::single(
            r#"{"suggestedPrice": 19.99, "justification": "Saves hours of manual work."}"#,
        );
        let response = run(&client, &request()).await.unwrap();
        assert_eq!(response.suggested_price, 19.99);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let client = CannedChatClient::single(
            r#"{"suggestedPrice": -5.0, "justification": "free money"}"#,
        );
        assert!(matches!(
            run(&client, &request()).await,
            Err(FlowError::Schema(_))
        ));
    }
}
