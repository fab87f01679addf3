//! Custom error types for Dessert.
//!
//! This module provides structured error types that separate fatal
//! configuration, provider and filesystem failures from the recoverable
//! degradations that are only logged. Cancellation is deliberately absent:
//! a cancelled run is reported through [`crate::pipeline::RunOutcome`].

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::ProviderError;

/// Main error type for Dessert operations
#[derive(Error, Debug)]
pub enum DessertError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Generic configuration problem
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No API key in the environment
    #[error("API key not found: set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    /// Provider name not recognised
    #[error("Unsupported AI provider: '{name}'. Valid options: openai, claude, gemini")]
    UnsupportedProvider { name: String },

    /// Paused file is not Kotlin, Java or Scala
    #[error("Unsupported file type '{file_name}'. Only Kotlin (.kt), Java (.java), and Scala (.scala) files are supported")]
    UnsupportedLanguage { file_name: String },

    /// The debug session is not paused
    #[error("No active debugging session found")]
    NoPausedSession,

    /// The paused session has no usable frame
    #[error("No stack frame available")]
    NoStackFrame,

    /// The host project has no base path on disk
    #[error("Project base path not found")]
    MissingBasePath,

    // =========================================================================
    // Provider Errors
    // =========================================================================
    /// AI provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    // =========================================================================
    // Filesystem Errors
    // =========================================================================
    /// A write-side filesystem operation failed
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DessertError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a filesystem error for the given path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Check if this error was raised before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::MissingApiKey { .. }
                | Self::UnsupportedProvider { .. }
                | Self::UnsupportedLanguage { .. }
                | Self::NoPausedSession
                | Self::NoStackFrame
                | Self::MissingBasePath
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Provider(ProviderError::Cancelled) => 130,
            Self::Provider(_) => 3,
            Self::Filesystem { .. } | Self::Io(_) => 4,
            e if e.is_configuration() => 2,
            _ => 1,
        }
    }

    /// A single human-readable line suitable for an error dialog
    pub fn user_message(&self) -> String {
        let text = self.to_string();
        let flattened: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        format!("Error generating test: {}", flattened.join(" "))
    }
}

/// Type alias for Dessert results
pub type Result<T> = std::result::Result<T, DessertError>;
