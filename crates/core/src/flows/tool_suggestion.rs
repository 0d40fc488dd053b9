//! # Tool & Plugin Suggestion Flow

use super::prompts;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolSuggestionRequest {
    /// Purpose, functionalities, and target use cases of the agent.
    pub agent_description: String,
}

impl ToolSuggestionRequest {
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
pub struct ToolSuggestionResponse {
    /// Names of tools and plugins that would extend the agent.
    pub suggested_tools_and_plugins: Vec<String>,
}

pub async fn run(
    client: &dyn ChatClient,
    request: &ToolSuggestionRequest,
) -> Result<ToolSuggestionResponse, FlowError> {
    run_with_prompt(client, prompts::TOOL_SUGGESTION, request).await
}

pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &ToolSuggestionRequest,
) -> Result<ToolSuggestionResponse, FlowError> {
    request.validate()?;
    let user = format!("Agent Description:\n{}", request.agent_description);
    super::invoke(client, system_prompt, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    #[tokio::test]
    async fn test_list_decodes() {
        let client = CannedChatClient::single(
            r#"{"suggestedToolsAndPlugins": ["Web Search", "Data Visualizer"]}"#,
        );
        let request = ToolSuggestionRequest {
            agent_description: "Tracks competitor pricing and charts trends".to_string(),
        };
        let response = run(&client, &request).await.unwrap();
        assert_eq!(
            response.suggested_tools_and_plugins,
            vec!["Web Search", "Data Visualizer"]
        );
    }

    #[tokio::test]
    async fn test_empty_description_rejected() {
        let client = CannedChatClient::new(Vec::<String>::new());
        let request = ToolSuggestionRequest {
            agent_description: String::new(),
        };
        assert!(matches!(
            run(&client, &request).await,
            Err(FlowError::InvalidRequest(_))
        ));
    }
}
