//! # Chat Client
//!
//! Minimal chat-completion abstraction the prompt flows call through: one
//! system+user exchange, one text reply. Retries, streaming, and partial
//! results are deliberately absent; a failed call is terminal.

use crate::error::FlowError;
use crate::models::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Opaque asynchronous model call used by every flow.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run a single exchange and return the model's text reply.
    async fn complete(&self, system: &str, user: &str) -> Result<String, FlowError>;
}

/// HTTP client for hosted model providers.
///
/// Anthropic uses its native messages API; every other provider goes
/// through OpenAI-compatible chat completions.
pub struct HttpChatClient {
    config: ModelConfig,
    api_key: String,
    http: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(config: ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.config.provider.default_base_url())
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String, FlowError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": 4096,
            "system": system,
            "messages": [{ "role": "user", "content": user }],
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url()))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FlowError::Provider(format!("{status}: {detail}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| FlowError::Provider(e.to_string()))?;
        value["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FlowError::Provider("response missing text content".to_string()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String, FlowError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url()))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlowError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FlowError::Provider(format!("{status}: {detail}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| FlowError::Provider(e.to_string()))?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FlowError::Provider("response missing message content".to_string()))
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, FlowError> {
        match self.config.provider {
            LlmProvider::Anthropic => self.complete_anthropic(system, user).await,
            _ => self.complete_openai(system, user).await,
        }
    }
}

/// Returns scripted replies in order; for tests and offline development.
pub struct CannedChatClient {
    replies: Mutex<VecDeque<String>>,
}

impl CannedChatClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    pub fn single(reply: impl Into<String>) -> Self {
        Self::new([reply.into()])
    }
}

#[async_trait]
impl ChatClient for CannedChatClient {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, FlowError> {
        self.replies
            .lock()
            .map_err(|e| FlowError::Provider(format!("reply lock poisoned: {e}")))?
            .pop_front()
            .ok_or_else(|| FlowError::Provider("no scripted reply left".to_string()))
    }
}

/// Extract the JSON payload from a model reply, tolerating markdown fences
/// and surrounding prose.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }
    let start = trimmed.find(|c| c == '{' || c == '[');
    let end = trimmed.rfind(|c| c == '}' || c == ']');
    match (start, end) {
        (Some(start), Some(end)) if end >= start => trimmed[start..=end].trim(),
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_passes_bare_objects_through() {
        assert_eq!(extract_json(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_strips_fences() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(fenced), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_trims_prose() {
        let chatty = "Here you go:\n{\"a\": 1}\nLet me know if that helps!";
        assert_eq!(extract_json(chatty), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_canned_client_exhausts_replies() {
        let client = CannedChatClient::single("one");
        assert_eq!(client.complete("s", "u").await.unwrap(), "one");
        assert!(matches!(
            client.complete("s", "u").await,
            Err(FlowError::Provider(_))
        ));
    }
}
