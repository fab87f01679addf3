//! Anthropic messages provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    non_empty_text, parse_body, send_checked, LlmClient, ProviderError, ProviderKind,
    MAX_OUTPUT_TOKENS,
};
use crate::cancel::CancellationFlag;

/// Production API base.
pub const CLAUDE_API_BASE: &str = "https://api.anthropic.com";

/// Protocol version sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Claude client.
#[derive(Clone)]
pub struct ClaudeProvider {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

// The key never appears in logs.
impl std::fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ClaudeProvider {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: CLAUDE_API_BASE.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Point the client at another server, e.g. a local mock.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for ClaudeProvider {
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationFlag,
    ) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        debug!(model = %self.model, "Sending Claude request");

        let builder = self
            .http
            .post(format!("{}{}", self.api_base, MESSAGES_PATH))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);
        let body = send_checked(ProviderKind::Claude, builder, cancel).await?;

        let response: MessagesResponse = parse_body(ProviderKind::Claude, &body)?;
        let text = response.content.into_iter().next().and_then(|block| block.text);
        non_empty_text(ProviderKind::Claude, text, &body)
    }

    fn provider_name(&self) -> &str {
        ProviderKind::Claude.display_name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
