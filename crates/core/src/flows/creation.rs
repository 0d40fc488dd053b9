//! # Creation Assist Flow
//!
//! Suggests a configuration and starter code for a new agent from a
//! description of what it should do.

use super::prompts;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreationAssistRequest {
    /// What the new agent should do.
    pub desired_functionality: String,
    /// Existing code to incorporate, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
}

impl CreationAssistRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.desired_functionality.trim().is_empty() {
            return Err(FlowError::InvalidRequest(
                "desiredFunctionality must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreationAssistResponse {
    /// Suggested configuration for the agent.
    pub suggested_configuration: String,
    /// A code snippet for the agent.
    pub code_snippet: String,
    /// Explanation of the code snippet.
    pub explanation: String,
}

/// Ask the model for a configuration and starter code for a new agent.
pub async fn run(
    client: &dyn ChatClient,
    request: &CreationAssistRequest,
) -> Result<CreationAssistResponse, FlowError> {
    run_with_prompt(client, prompts::CREATION_ASSISTANT, request).await
}

/// Same as [`run`], with a caller-supplied system prompt (e.g. an edited
/// template loaded from the database).
pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &CreationAssistRequest,
) -> Result<CreationAssistResponse, FlowError> {
    request.validate()?;

    let mut user = format!("Desired functionality:\n{}", request.desired_functionality);
    if let Some(code) = &request.existing_code {
        user.push_str(&format!("\n\nExisting code:\n{code}"));
    }
    if let Some(agent_type) = &request.agent_type {
        user.push_str(&format!("\n\nAgent type: {agent_type}"));
    }

    super::invoke(client, system_prompt, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    fn request() -> CreationAssistRequest {
        CreationAssistRequest {
            desired_functionality: "Summarize RSS feeds each morning".to_string(),
            existing_code: None,
            agent_type: Some("scheduled".to_string()),
        }
    }

    #[tokio::test]
    async fn test_parses_model_reply() {
        let client = CannedChatClient::single(
            r#"{"suggestedConfiguration": "model: sonnet", "codeSnippet": "fn main() {}", "explanation": "A stub."}"#,
        );
        let response = run(&client, &request()).await.unwrap();
        assert_eq!(response.suggested_configuration, "model: sonnet");
        assert_eq!(response.code_snippet, "fn main() {}");
    }

    #[tokio::test]
    async fn test_fenced_reply_is_tolerated() {
        let client = CannedChatClient::single(
            "```json\n{\"suggestedConfiguration\": \"c\", \"codeSnippet\": \"s\", \"explanation\": \"e\"}\n```",
        );
        assert!(run(&client, &request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_functionality_rejected_before_model_call() {
        let client = CannedChatClient::new(Vec::<String>::new());
        let bad = CreationAssistRequest {
            desired_functionality: "   ".to_string(),
            existing_code: None,
            agent_type: None,
        };
        assert!(matches!(
            run(&client, &bad).await,
            Err(FlowError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_field_fails_schema_validation() {
        let client = CannedChatClient::single(r#"{"suggestedConfiguration": "only one"}"#);
        assert!(matches!(
            run(&client, &request()).await,
            Err(FlowError::Schema(_))
        ));
    }
}
