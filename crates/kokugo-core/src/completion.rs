//! Client for the AI completion endpoint.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::{PlannerError, Result};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/generate";

/// Turns a prompt into a structured lesson plan.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the parsed JSON body of the completion.
    async fn complete(&self, prompt: &str) -> Result<Value>;
}

/// Posts `{"prompt": …}` to a fixed URL and expects a JSON body back.
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpCompletionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Value> {
        debug!("Requesting completion from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = match text.trim() {
                "" => status
                    .canonical_reason()
                    .map_or_else(|| status.to_string(), str::to_string),
                body => body.to_string(),
            };
            return Err(PlannerError::generation(message));
        }

        parse_completion_body(&text)
    }
}

/// Parses a completion body, tolerating a surrounding Markdown code fence.
///
/// ```rust
/// use kokugo_core::completion::parse_completion_body;
///
/// let value = parse_completion_body("```json\n{\"学年\": \"3年\"}\n```").unwrap();
/// assert_eq!(value["学年"], "3年");
/// assert!(parse_completion_body("not json").is_err());
/// ```
pub fn parse_completion_body(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(|inner| {
            // Drop the info string ("json") on the opening fence line.
            inner.split_once('\n').map_or(inner, |(_, code)| code)
        })
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim())
        .map_err(|e| PlannerError::generation(format!("invalid JSON from completion endpoint: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_completion_body(" {\"授業時間数\": 3} ").unwrap();
        assert_eq!(value["授業時間数"], 3);
    }

    #[test]
    fn test_parse_fenced_json_without_language() {
        let value = parse_completion_body("```\n[1, 2]\n```").unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_invalid_body_is_generation_error() {
        let err = parse_completion_body("<html>oops</html>").unwrap_err();
        assert!(matches!(err, PlannerError::Generation { .. }));
    }
}
