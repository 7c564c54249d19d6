//! Hosted workflow agents — the single point of entry for all AI calls.
//!
//! Two workflows are used: the summary agent (profile summaries and Question
//! answers) and the content filter agent (post vetting). Both run on the same
//! workflow runner behind one client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Documents longer than this are cut before being sent to a workflow.
const MAX_DOCUMENT_CHARS: usize = 90_000;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("workflow {workflow_id} failed (status {status}): {message}")]
    Api {
        workflow_id: String,
        status: u16,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    documents: &'a str,
    template: &'a str,
    user_email: &'a str,
}

#[derive(Debug, Serialize)]
struct FilterRequest<'a> {
    user_content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowReply {
    #[serde(rename = "responseStr", default)]
    pub response_str: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowData {
    #[serde(default)]
    pub outputs: Option<Value>,
    #[serde(default)]
    pub response: Option<WorkflowReply>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Wire shape of a workflow run. A populated `error` field is a valid
/// result, not a transport failure — see `run_workflow`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub data: WorkflowData,
    #[serde(default)]
    pub error: Option<Value>,
}

impl WorkflowResponse {
    /// Structured outputs, when the workflow produced any.
    pub fn outputs(&self) -> Option<&Value> {
        self.data.outputs.as_ref()
    }

    /// Free-text reply, when the workflow produced one.
    pub fn response_text(&self) -> Option<&str> {
        self.data.response.as_ref().map(|r| r.response_str.as_str())
    }
}

/// The single workflow-runner client used by all handlers.
#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
    api_key: String,
    summary_workflow_id: String,
    filter_workflow_id: String,
}

impl AgentClient {
    pub fn new(
        base_url: String,
        api_key: String,
        summary_workflow_id: String,
        filter_workflow_id: String,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
            summary_workflow_id,
            filter_workflow_id,
        }
    }

    /// Runs the summary workflow. `documents` may be page ids or raw text and
    /// is truncated to a safe length before sending.
    pub async fn run_summary(
        &self,
        documents: &str,
        template: &str,
        user_email: &str,
    ) -> Result<WorkflowResponse, AgentError> {
        let documents = truncate_documents(documents);
        self.run_workflow(
            &self.summary_workflow_id,
            &SummaryRequest {
                documents: &documents,
                template,
                user_email,
            },
        )
        .await
    }

    /// Runs the content filter workflow against a serialized post payload.
    pub async fn run_content_filter(
        &self,
        user_content: &str,
    ) -> Result<WorkflowResponse, AgentError> {
        self.run_workflow(&self.filter_workflow_id, &FilterRequest { user_content })
            .await
    }

    async fn run_workflow<T: Serialize>(
        &self,
        workflow_id: &str,
        payload: &T,
    ) -> Result<WorkflowResponse, AgentError> {
        let url = format!("{}/workflows/{}/run", self.base_url, workflow_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: WorkflowResponse = serde_json::from_str(&body)?;

        // A workflow that answered with an error payload is passed through;
        // only HTTP-level failures are fatal.
        if let Some(error) = &parsed.error {
            warn!("workflow {workflow_id} answered with payload error: {error}");
            return Ok(parsed);
        }

        if !status.is_success() {
            return Err(AgentError::Api {
                workflow_id: workflow_id.to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        debug!(
            "workflow {workflow_id} run succeeded (status: {})",
            parsed.data.status.as_deref().unwrap_or("unknown")
        );
        Ok(parsed)
    }
}

/// Strips the decoration the summary agent wraps around JSON answers:
/// markdown code fences (with or without a `json` tag) and stray
/// surrounding quotes.
pub fn strip_response_decorations(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().trim_matches(|c| c == '"' || c == '\'')
}

fn truncate_documents(documents: &str) -> String {
    if documents.len() <= MAX_DOCUMENT_CHARS {
        return documents.to_string();
    }
    let mut end = MAX_DOCUMENT_CHARS;
    while !documents.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &documents[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_decorations_with_json_fence() {
        let input = "```json\n{\"role\": \"Engineer\"}\n```";
        assert_eq!(strip_response_decorations(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_strip_decorations_with_bare_fence() {
        let input = "```\n{\"role\": \"Engineer\"}\n```";
        assert_eq!(strip_response_decorations(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_strip_decorations_with_surrounding_quotes() {
        let input = "'{\"role\": \"Engineer\"}'";
        assert_eq!(strip_response_decorations(input), "{\"role\": \"Engineer\"}");
    }

    #[test]
    fn test_strip_decorations_plain_input_unchanged() {
        let input = "{\"role\": \"Engineer\"}";
        assert_eq!(strip_response_decorations(input), input);
    }

    #[test]
    fn test_truncate_documents_short_input_untouched() {
        assert_eq!(truncate_documents("abc"), "abc");
    }

    #[test]
    fn test_truncate_documents_marks_the_cut() {
        let long = "x".repeat(MAX_DOCUMENT_CHARS + 10);
        let truncated = truncate_documents(&long);
        assert!(truncated.ends_with("... [truncated]"));
        assert_eq!(
            truncated.len(),
            MAX_DOCUMENT_CHARS + "... [truncated]".len()
        );
    }

    #[test]
    fn test_workflow_response_accepts_error_payload() {
        let json = r#"{"data": {"status": "failed"}, "error": {"message": "workflow exploded"}}"#;
        let parsed: WorkflowResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.error.is_some());
        assert!(parsed.outputs().is_none());
        assert!(parsed.response_text().is_none());
    }

    #[test]
    fn test_workflow_response_exposes_reply_text() {
        let json = r#"{"data": {"response": {"responseStr": "hello"}, "status": "ok"}}"#;
        let parsed: WorkflowResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response_text(), Some("hello"));
    }
}
