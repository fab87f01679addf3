//! Model client abstraction for test generation.
//!
//! This module provides a trait-based abstraction over the three supported
//! providers, so the pipeline holds one `Box<dyn LlmClient>` chosen from
//! configuration and never branches on the provider itself.
//!
//! # Architecture
//!
//! The [`LlmClient`] trait defines the one capability every provider offers:
//! prompt text in, generated text out, under a cancellation flag. It is:
//!
//! - **Object-safe**: Supports dynamic dispatch via `Box<dyn LlmClient>`
//! - **Thread-safe**: `Send + Sync` bounds enable use from async tasks
//! - **Cooperatively cancellable**: The flag is checked right before the
//!   request is sent and right after the response arrives, never during
//!
//! # Example
//!
//! ```rust,ignore
//! use dessert::llm::{build_client, LlmClient};
//! use dessert::cancel::CancellationFlag;
//!
//! let client = build_client(&config);
//! let text = client.generate("Write a test", &CancellationFlag::new()).await?;
//! ```

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cancel::CancellationFlag;
use crate::config::GeneratorConfig;

/// Output token limit sent to every provider.
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Sampling temperature for providers that accept one.
pub const TEMPERATURE: f64 = 0.0;

// =============================================================================
// Provider Selection
// =============================================================================

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages
    Claude,
    /// Google generateContent
    #[default]
    Gemini,
}

impl ProviderKind {
    /// Model used when none is configured.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dessert::llm::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::Gemini.default_model(), "gemini-2.5-flash");
    /// ```
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "o4-mini",
            Self::Claude => "claude-3-7-sonnet-latest",
            Self::Gemini => "gemini-2.5-flash",
        }
    }

    /// Human-readable provider name, used in messages and errors.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = crate::error::DessertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            _ => Err(crate::error::DessertError::UnsupportedProvider {
                name: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Provider Errors
// =============================================================================

/// Failure of a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Non-success HTTP status
    #[error("{provider} API error: {status} - {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    /// The response did not match the provider's shape
    #[error("Malformed {provider} response: {message} - {body}")]
    MalformedResponse {
        provider: String,
        message: String,
        body: String,
    },

    /// The response held no generated text
    #[error("No response from {provider} or empty response")]
    EmptyResponse { provider: String, body: String },

    /// The run was cancelled before or after the call
    #[error("Generation cancelled")]
    Cancelled,
}

impl ProviderError {
    /// HTTP status, when the provider answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when there was one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. }
            | Self::MalformedResponse { body, .. }
            | Self::EmptyResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Client Trait
// =============================================================================

/// A model provider that turns a prompt into generated text.
///
/// # Example
///
/// ```rust,ignore
/// use dessert::llm::LlmClient;
///
/// async fn run(client: &dyn LlmClient, prompt: &str) -> Result<String, ProviderError> {
///     println!("Using {} ({})", client.provider_name(), client.model_name());
///     client.generate(prompt, &CancellationFlag::new()).await
/// }
/// ```
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Cancelled`] if `cancel` is set before the
    /// request is sent or once the response has arrived. Any other variant
    /// is a failed call.
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationFlag,
    ) -> Result<String, ProviderError>;

    /// Provider name for logs and messages.
    fn provider_name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;
}

/// Build the client for `config`.
pub fn build_client(config: &GeneratorConfig) -> Box<dyn LlmClient> {
    debug!(provider = %config.provider, model = %config.model, "Building model client");
    let base = config.api_base.as_deref();
    match config.provider {
        ProviderKind::OpenAi => {
            let client = OpenAiProvider::new(&config.model, &config.api_key);
            Box::new(match base {
                Some(base) => client.with_api_base(base),
                None => client,
            })
        }
        ProviderKind::Claude => {
            let client = ClaudeProvider::new(&config.model, &config.api_key);
            Box::new(match base {
                Some(base) => client.with_api_base(base),
                None => client,
            })
        }
        ProviderKind::Gemini => {
            let client = GeminiProvider::new(&config.model, &config.api_key);
            Box::new(match base {
                Some(base) => client.with_api_base(base),
                None => client,
            })
        }
    }
}

/// Send a prepared JSON request and return the raw body of a 200 response.
///
/// `request` must carry its body through `RequestBuilder::json`, which also
/// sets the `Content-Type` header.
///
/// Cancellation is checked before sending and after the body is read; the
/// in-flight request itself is not interrupted.
pub(crate) async fn send_checked(
    provider: ProviderKind,
    request: reqwest::RequestBuilder,
    cancel: &CancellationFlag,
) -> Result<String, ProviderError> {
    if cancel.is_cancelled() {
        debug!(provider = %provider, "Cancelled before request");
        return Err(ProviderError::Cancelled);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;

    if cancel.is_cancelled() {
        debug!(provider = %provider, "Cancelled after response");
        return Err(ProviderError::Cancelled);
    }

    debug!(provider = %provider, status = status.as_u16(), bytes = body.len(), "Provider responded");
    if status != reqwest::StatusCode::OK {
        return Err(ProviderError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

// The URL is dropped since Gemini carries the API key in its query string.
fn transport_error(provider: ProviderKind, error: reqwest::Error) -> ProviderError {
    ProviderError::Transport {
        provider: provider.to_string(),
        message: error.without_url().to_string(),
    }
}

/// The generated text, or [`ProviderError::EmptyResponse`] when it is
/// missing or blank.
pub(crate) fn non_empty_text(
    provider: ProviderKind,
    text: Option<String>,
    body: &str,
) -> Result<String, ProviderError> {
    text.filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ProviderError::EmptyResponse {
            provider: provider.to_string(),
            body: body.to_string(),
        })
}

/// Parse a 200 body into the provider's response shape.
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    provider: ProviderKind,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
        provider: provider.to_string(),
        message: e.to_string(),
        body: body.to_string(),
    })
}

// =============================================================================
// Mock Client
// =============================================================================

/// Mock model client for testing.
///
/// Provides controllable behavior for unit tests without making actual
/// API calls. Follows the same two-point cancellation protocol as the real
/// providers. Thread-safe for use in async contexts.
///
/// # Example
///
/// ```rust,ignore
/// use dessert::llm::MockLlmClient;
///
/// let client = MockLlmClient::new()
///     .with_response("class CartTest {}")
///     .with_model_name("mock-model");
///
/// assert_eq!(client.generate("test", &flag).await.unwrap(), "class CartTest {}");
/// ```
#[derive(Debug)]
pub struct MockLlmClient {
    /// Response to return from `generate`.
    response: String,
    /// Error to return (if set).
    error: Option<ProviderError>,
    /// Model name to return.
    model: String,
    /// Set the caller's flag while the "request" is in flight.
    cancel_in_flight: bool,
    /// Count of generate calls that reached the "network".
    call_count: AtomicU32,
    /// Prompts received, in order.
    prompts: Mutex<Vec<String>>,
}

impl Clone for MockLlmClient {
    fn clone(&self) -> Self {
        Self {
            response: self.response.clone(),
            error: self.error.clone(),
            model: self.model.clone(),
            cancel_in_flight: self.cancel_in_flight,
            call_count: AtomicU32::new(self.call_count.load(Ordering::SeqCst)),
            prompts: Mutex::new(self.prompts()),
        }
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self {
            response: String::new(),
            error: None,
            model: "mock-llm".to_string(),
            cancel_in_flight: false,
            call_count: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl MockLlmClient {
    /// Create a new mock client with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response to return.
    #[must_use]
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail with a transport error.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(ProviderError::Transport {
            provider: "Mock".to_string(),
            message: error.to_string(),
        });
        self
    }

    /// Configure the mock to fail with the given error.
    #[must_use]
    pub fn with_provider_error(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model_name(mut self, name: &str) -> Self {
        self.model = name.to_string();
        self
    }

    /// Cancel the caller's flag while the call is in flight.
    #[must_use]
    pub fn cancelling_in_flight(mut self) -> Self {
        self.cancel_in_flight = true;
        self
    }

    /// Get the number of calls that got past the pre-send check.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationFlag,
    ) -> Result<String, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        if self.cancel_in_flight {
            cancel.cancel();
        }
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        match self.error {
            Some(ref error) => Err(error.clone()),
            None => Ok(self.response.clone()),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ProviderKind Tests
    // =========================================================================

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!(" GEMINI ".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);

        let err = "llama".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("llama"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_provider_kind_defaults() {
        assert_eq!(ProviderKind::default(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::OpenAi.default_model(), "o4-mini");
        assert_eq!(ProviderKind::Claude.default_model(), "claude-3-7-sonnet-latest");
        assert_eq!(ProviderKind::Claude.to_string(), "Claude");
    }

    // =========================================================================
    // ProviderError Tests
    // =========================================================================

    #[test]
    fn test_provider_error_accessors() {
        let http = ProviderError::Http {
            provider: "Claude".into(),
            status: 500,
            body: "{\"error\":\"overloaded\"}".into(),
        };
        assert_eq!(http.status(), Some(500));
        assert_eq!(http.body(), Some("{\"error\":\"overloaded\"}"));
        assert_eq!(
            http.to_string(),
            "Claude API error: 500 - {\"error\":\"overloaded\"}"
        );

        let empty = ProviderError::EmptyResponse {
            provider: "Gemini".into(),
            body: "{\"candidates\":[]}".into(),
        };
        assert_eq!(empty.status(), None);
        assert_eq!(empty.body(), Some("{\"candidates\":[]}"));
        assert!(!empty.is_cancelled());
        assert!(ProviderError::Cancelled.is_cancelled());
    }

    // =========================================================================
    // Client Trait Tests
    // =========================================================================

    #[tokio::test]
    async fn test_llm_client_trait_is_object_safe() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::new().with_response("boxed"));
        let text = client.generate("p", &CancellationFlag::new()).await.unwrap();
        assert_eq!(text, "boxed");
        assert_eq!(client.provider_name(), "Mock");
    }

    #[test]
    fn test_llm_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockLlmClient>();
        assert_send_sync::<OpenAiProvider>();
        assert_send_sync::<ClaudeProvider>();
        assert_send_sync::<GeminiProvider>();
    }

    #[test]
    fn test_build_client_selects_provider() {
        for (provider, name) in [
            (ProviderKind::OpenAi, "OpenAI"),
            (ProviderKind::Claude, "Claude"),
            (ProviderKind::Gemini, "Gemini"),
        ] {
            let config = GeneratorConfig::new(provider, "key");
            let client = build_client(&config);
            assert_eq!(client.provider_name(), name);
            assert_eq!(client.model_name(), provider.default_model());
        }
    }

    // =========================================================================
    // MockLlmClient Tests
    // =========================================================================

    #[tokio::test]
    async fn test_mock_llm_client_basic_usage() {
        let client = MockLlmClient::new()
            .with_response("class FooTest")
            .with_model_name("mock-v1");

        let response = client.generate("prompt", &CancellationFlag::new()).await.unwrap();
        assert_eq!(response, "class FooTest");
        assert_eq!(client.model_name(), "mock-v1");
        assert_eq!(client.prompts(), vec!["prompt".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_llm_client_error() {
        let client = MockLlmClient::new().with_error("connection refused");
        let err = client.generate("p", &CancellationFlag::new()).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_mock_checks_cancellation_before_call() {
        let client = MockLlmClient::new().with_response("x");
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let err = client.generate("p", &cancel).await.unwrap_err();
        assert_eq!(err, ProviderError::Cancelled);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_checks_cancellation_after_call() {
        let client = MockLlmClient::new().with_response("x").cancelling_in_flight();
        let cancel = CancellationFlag::new();

        let err = client.generate("p", &cancel).await.unwrap_err();
        assert_eq!(err, ProviderError::Cancelled);
        assert_eq!(client.call_count(), 1);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_mock_llm_client_clone() {
        let client = MockLlmClient::new().with_response("cloned");
        client.generate("first", &CancellationFlag::new()).await.unwrap();

        let cloned = client.clone();
        assert_eq!(cloned.call_count(), 1);
        assert_eq!(cloned.prompts(), vec!["first".to_string()]);
    }
}
