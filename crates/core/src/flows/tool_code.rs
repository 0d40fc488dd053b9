//! # Tool Code Suggestion Flow

use super::prompts;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolCodeRequest {
    /// Description of the tool to create.
    pub tool_description: String,
}

impl ToolCodeRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.tool_description.trim().is_empty() {
            return Err(FlowError::InvalidRequest(
                "toolDescription must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCodeResponse {
    /// Suggested camelCase name for the tool function.
    pub suggested_name: String,
    pub suggested_description: String,
    pub code_snippet: String,
}

pub async fn run(
    client: &dyn ChatClient,
    request: &ToolCodeRequest,
) -> Result<ToolCodeResponse, FlowError> {
    run_with_prompt(client, prompts::TOOL_CODE, request).await
}

pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &ToolCodeRequest,
) -> Result<ToolCodeResponse, FlowError> {
    request.validate()?;
    let user = format!("User's Tool Description:\n{}", request.tool_description);
    let response: ToolCodeResponse = super::invoke(client, system_prompt, &user).await?;
    if response.suggested_name.trim().is_empty() {
        return Err(FlowError::Schema("suggestedName must not be empty".into()));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    #[tokio::test]
    async fn test_snippet_decodes() {
        let client = CannedChatClient::single(
            r#"{"suggestedName": "currencyConverter", "suggestedDescription": "Converts currencies.", "codeSnippet": "async fn currency_converter() {}"}"#,
        );
        let request = ToolCodeRequest {
            tool_description: "Convert between currencies using live rates".to_string(),
        };
        let response = run(&client, &request).await.unwrap();
        assert_eq!(response.suggested_name, "currencyConverter");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let client = CannedChatClient::single(
            r#"{"suggestedName": " ", "suggestedDescription": "d", "codeSnippet": "c"}"#,
        );
        let request = ToolCodeRequest {
            tool_description: "anything".to_string(),
        };
        assert!(matches!(
            run(&client, &request).await,
            Err(FlowError::Schema(_))
        ));
    }
}
