//! # Security Assessment Flow
//!
//! Audits an agent's description and code for vulnerabilities. A completed
//! assessment marks the catalog entry as `scanned`; the verdict itself is
//! reported to the caller alongside the findings.

use super::prompts;
use crate::catalog::SecurityRating;
use crate::error::FlowError;
use crate::llm::ChatClient;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAssessRequest {
    pub agent_description: String,
    /// The agent's code or logic, as text.
    pub agent_code: String,
}

impl SecurityAssessRequest {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.agent_description.trim().is_empty() {
            return Err(FlowError::InvalidRequest(
                "agentDescription must not be empty".into(),
            ));
        }
        if self.agent_code.trim().is_empty() {
            return Err(FlowError::InvalidRequest(
                "agentCode must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Overall verdict of an assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecurityVerdict {
    Secure,
    Caution,
    Insecure,
}

impl SecurityVerdict {
    /// Catalog rating an entry earns once it has been through an
    /// assessment, whatever the verdict: it has been scanned.
    pub fn catalog_rating(&self) -> SecurityRating {
        SecurityRating::Scanned
    }
}

/// One potential vulnerability.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFinding {
    pub finding: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAssessResponse {
    pub overall_rating: SecurityVerdict,
    pub summary: String,
    pub findings: Vec<SecurityFinding>,
}

pub async fn run(
    client: &dyn ChatClient,
    request: &SecurityAssessRequest,
) -> Result<SecurityAssessResponse, FlowError> {
    run_with_prompt(client, prompts::SECURITY_AUDITOR, request).await
}

pub async fn run_with_prompt(
    client: &dyn ChatClient,
    system_prompt: &str,
    request: &SecurityAssessRequest,
) -> Result<SecurityAssessResponse, FlowError> {
    request.validate()?;
    let user = format!(
        "Agent Description:\n{}\n\nAgent Code/Logic:\n{}",
        request.agent_description, request.agent_code
    );
    super::invoke(client, system_prompt, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CannedChatClient;

    fn request() -> SecurityAssessRequest {
        SecurityAssessRequest {
            agent_description: "Reads arbitrary URLs".to_string(),
            agent_code: "fetch(url)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_verdict_and_findings_decode() {
        let client = CannedChatClient::single(
            r#"{"overallRating": "caution", "summary": "SSRF risk.",
                "findings": [{"finding": "Unvalidated URL fetch", "recommendation": "Allow-list hosts"}]}"#,
        );
        let response = run(&client, &request()).await.unwrap();
        assert_eq!(response.overall_rating, SecurityVerdict::Caution);
        assert_eq!(response.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_verdict_fails_validation() {
        let client = CannedChatClient::single(
            r#"{"overallRating": "fine", "summary": "s", "findings": []}"#,
        );
        assert!(matches!(
            run(&client, &request()).await,
            Err(FlowError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_code_rejected() {
        let client = CannedChatClient::new(Vec::<String>::new());
        let bad = SecurityAssessRequest {
            agent_description: "desc".to_string(),
            agent_code: " ".to_string(),
        };
        assert!(matches!(
            run(&client, &bad).await,
            Err(FlowError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_any_verdict_marks_entry_scanned() {
        assert_eq!(
            SecurityVerdict::Insecure.catalog_rating(),
            SecurityRating::Scanned
        );
        assert_eq!(
            SecurityVerdict::Secure.catalog_rating(),
            SecurityRating::Scanned
        );
    }
}
