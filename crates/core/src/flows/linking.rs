//! # Linking Assist Flow
//!
//! Given two agent descriptions, suggests connection points, validates the
//! data flow between them, and generates orchestration glue code.

use super::prompts;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkingAssistRequest {
    /// Purpose, inputs, and outputs of the first agent.
    pub agent_a_description: String,
    /// Purpose, inputs, and outputs of the second agent.
    pub agent_b_description: String,
}

impl LinkingAssistRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.agent_a_description.trim().is_empty() || self.agent_b_description.trim().is_empty()
        {
            return Err(FlowError::InvalidRequest(
                "both agent descriptions must be provided".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkingAssistResponse {
    /// How the two agents can be connected, with specific inputs/outputs.
    pub suggested_connection_points: String,
    /// Analysis of the data flow, including potential issues.
    pub data_flow_validation: String,
    /// Orchestration snippet linking the two agents.
    pub generated_code: String,
}

pub async fn run(
    client: &dyn ChatClient,
    request: &LinkingAssistRequest,
) -> Result<LinkingAssistResponse, FlowError> {
    run_with_prompt(client, prompts::LINKING_ASSISTANT, request).await
}

pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &LinkingAssistRequest,
) -> Result<LinkingAssistResponse, FlowError> {
    request.validate()?;
    let user = format!(
        "Agent 1: {}\n\nAgent 2: {}",
        request.agent_a_description, request.agent_b_description
    );
    super::invoke(client, system_prompt, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    #[tokio::test]
    async fn test_round_trip() {
        let client = CannedChatClient::single(
            r#"{"suggestedConnectionPoints": "A out -> B in", "dataFlowValidation": "Types line up.", "generatedCode": "let b = agent_b(agent_a(input));"}"#,
        );
        let request = LinkingAssistRequest {
            agent_a_description: "Scrapes product pages".to_string(),
            agent_b_description: "Writes price reports".to_string(),
        };
        let response = run(&client, &request).await.unwrap();
        assert!(response.generated_code.contains("agent_b"));
    }

    #[tokio::test]
    async fn test_blank_description_rejected() {
        let client = CannedChatClient::new(Vec::<String>::new());
        let request = LinkingAssistRequest {
            agent_a_description: "Fine".to_string(),
            agent_b_description: "".to_string(),
        };
        assert!(matches!(
            run(&client, &request).await,
            Err(FlowError::InvalidRequest(_))
        ));
    }
}
