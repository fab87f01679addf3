//! OpenAI chat-completions provider.
//!
//! Sends the prompt as a single user message with bearer-token auth and
//! returns the first choice's message content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    non_empty_text, parse_body, send_checked, LlmClient, ProviderError, ProviderKind,
    MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use crate::cancel::CancellationFlag;

/// Production API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI client.
#[derive(Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

// The key never appears in logs.
impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: OPENAI_API_BASE.to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}{}", self.api_base, COMPLETIONS_PATH)
    }
}

#[async_trait]
impl LlmClient for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationFlag,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };
        debug!(model = %self.model, "Sending OpenAI request");

        let builder = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request);
        let body = send_checked(ProviderKind::OpenAi, builder, cancel).await?;

        let response: ChatResponse = parse_body(ProviderKind::OpenAi, &body)?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        non_empty_text(ProviderKind::OpenAi, text, &body)
    }

    fn provider_name(&self) -> &str {
        ProviderKind::OpenAi.display_name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
