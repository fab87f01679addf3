//! Generator configuration.
//!
//! Provider, model and API key are read from the environment once, at
//! startup, into a [`GeneratorConfig`] value that is passed to the pipeline.
//! Nothing reads the environment during a run.

use tracing::debug;

use crate::error::{DessertError, Result};
use crate::llm::ProviderKind;

/// Provider selection: `openai`, `claude` or `gemini`.
pub const PROVIDER_ENV: &str = "AI_PROVIDER";
/// Model identifier; defaults per provider.
pub const MODEL_ENV: &str = "MODEL_NAME";
/// API key for the selected provider. Required.
pub const API_KEY_ENV: &str = "API_KEY";

/// Optional provider endpoint override, e.g. a proxy or a local mock.
pub const API_BASE_ENV: &str = "API_BASE";

/// Prefix of the fallback variable names, e.g. `DESSERT_API_KEY`.
pub const ENV_PREFIX: &str = "DESSERT_";

/// Which provider to call, with which model and key.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    /// Endpoint override; `None` uses the provider's public API
    pub api_base: Option<String>,
}

// The key never appears in logs.
impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeneratorConfig {
    /// Config for `provider` with its default model.
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: api_key.into(),
            api_base: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Each setting is read from its plain name first, then from the
    /// `DESSERT_`-prefixed name. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// - [`DessertError::UnsupportedProvider`] for an unknown provider name
    /// - [`DessertError::MissingApiKey`] when no key is set
    ///
    /// # Example
    ///
    /// ```
    /// use dessert::config::GeneratorConfig;
    /// use dessert::llm::ProviderKind;
    ///
    /// let config = GeneratorConfig::from_lookup(|name| match name {
    ///     "AI_PROVIDER" => Some("claude".to_string()),
    ///     "API_KEY" => Some("secret".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.provider, ProviderKind::Claude);
    /// assert_eq!(config.model, "claude-3-7-sonnet-latest");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&format!("{}{}", ENV_PREFIX, name)))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let provider = match read(PROVIDER_ENV) {
            Some(name) => name.parse::<ProviderKind>()?,
            None => ProviderKind::default(),
        };
        let model = read(MODEL_ENV).unwrap_or_else(|| provider.default_model().to_string());
        let api_key = read(API_KEY_ENV).ok_or_else(|| DessertError::MissingApiKey {
            env_var: API_KEY_ENV.to_string(),
        })?;
        let api_base = read(API_BASE_ENV);

        debug!(
            provider = %provider,
            model = %model,
            api_base = api_base.as_deref().unwrap_or("default"),
            "Loaded generator configuration"
        );
        Ok(Self {
            provider,
            model,
            api_key,
            api_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_gemini() {
        let config = GeneratorConfig::from_lookup(lookup(&[("API_KEY", "k")])).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.api_key, "k");
    }

    #[test]
    fn test_provider_is_case_insensitive() {
        let config = GeneratorConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "OpenAI"),
            ("API_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "o4-mini");
    }

    #[test]
    fn test_model_override() {
        let config = GeneratorConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "claude"),
            ("MODEL_NAME", "claude-sonnet-4-0"),
            ("API_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.model, "claude-sonnet-4-0");
    }

    #[test]
    fn test_prefixed_fallbacks() {
        let config = GeneratorConfig::from_lookup(lookup(&[
            ("DESSERT_AI_PROVIDER", "claude"),
            ("DESSERT_API_KEY", "prefixed"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Claude);
        assert_eq!(config.api_key, "prefixed");
    }

    #[test]
    fn test_plain_name_wins_over_prefixed() {
        let config = GeneratorConfig::from_lookup(lookup(&[
            ("API_KEY", "plain"),
            ("DESSERT_API_KEY", "prefixed"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "plain");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = GeneratorConfig::from_lookup(lookup(&[("AI_PROVIDER", "openai")])).unwrap_err();
        assert!(matches!(err, DessertError::MissingApiKey { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_blank_key_is_missing() {
        let err = GeneratorConfig::from_lookup(lookup(&[("API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, DessertError::MissingApiKey { .. }));
    }

    #[test]
    fn test_unknown_provider() {
        let err = GeneratorConfig::from_lookup(lookup(&[
            ("AI_PROVIDER", "llama"),
            ("API_KEY", "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DessertError::UnsupportedProvider { ref name } if name == "llama"));
    }

    #[test]
    fn test_api_base_override() {
        let config = GeneratorConfig::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("DESSERT_API_BASE", "http://127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(config.api_base.as_deref(), Some("http://127.0.0.1:8080"));

        let plain = GeneratorConfig::from_lookup(lookup(&[("API_KEY", "k")])).unwrap();
        assert_eq!(plain.api_base, None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeneratorConfig::new(ProviderKind::Claude, "super-secret");
        let text = format!("{:?}", config);
        assert!(!text.contains("super-secret"));
        assert!(text.contains("<redacted>"));
    }
}
