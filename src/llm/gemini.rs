//! Google generateContent provider.
//!
//! The model name is part of the URL and the API key travels in the query
//! string. An empty or missing text part is an error of its own, distinct
//! from transport and status failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    non_empty_text, parse_body, send_checked, LlmClient, ProviderError, ProviderKind,
    MAX_OUTPUT_TOKENS, TEMPERATURE,
};
use crate::cancel::CancellationFlag;

/// Production API base.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini client.
#[derive(Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

// The key never appears in logs.
impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: GEMINI_API_BASE.to_string(),
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
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationFlag,
    ) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };
        debug!(model = %self.model, "Sending Gemini request");

        let builder = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request);
        let body = send_checked(ProviderKind::Gemini, builder, cancel).await?;

        let response: GenerateResponse = parse_body(ProviderKind::Gemini, &body)?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|parts| parts.into_iter().next())
            .and_then(|part| part.text);
        non_empty_text(ProviderKind::Gemini, text, &body)
    }

    fn provider_name(&self) -> &str {
        ProviderKind::Gemini.display_name()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
