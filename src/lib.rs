//! Dessert - unit tests from a paused debugger frame
//!
//! Captures the state of a paused JVM-language frame (Kotlin, Java or Scala),
//! asks an interchangeable AI provider to write a unit test for it, and
//! places the result where the project's build system expects tests.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`capture`] - Frame capture: bounded variable extraction and the capture block
//! - [`project`] - Language and build-system detection, project inspection
//! - [`placement`] - Test file path resolution and writing
//! - [`prompt`] - Prompt assembly for create and extend modes
//! - [`llm`] - AI provider clients (OpenAI, Claude, Gemini)
//! - [`config`] - Provider configuration from the environment
//! - [`pipeline`] - One end-to-end run with progress and cancellation
//! - [`snapshot`] - Recorded frames for replay outside a debugger
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dessert::snapshot::{FrameSnapshot, ReplaySession};
//! use dessert::{GeneratorConfig, Pipeline, RunOutcome};
//!
//! let config = GeneratorConfig::from_env()?;
//! let pipeline = Pipeline::new(&config);
//!
//! let root = std::path::PathBuf::from(".");
//! let frame = FrameSnapshot::load("frame.json".as_ref())?.into_frame(&root);
//! match pipeline.run(Arc::new(frame), &ReplaySession, &Some(root)).await? {
//!     RunOutcome::Written(path) => println!("wrote {}", path.display()),
//!     RunOutcome::Cancelled => println!("cancelled"),
//! }
//! ```

pub mod cancel;
pub mod capture;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod placement;
pub mod project;
pub mod prompt;
pub mod snapshot;
pub mod testing;

// Re-export commonly used types
pub use cancel::CancellationFlag;
pub use error::{DessertError, Result};

// Re-export project types
pub use project::{BuildSystem, ProjectContext, ProjectInspector, SourceLanguage};

// Re-export capture types
pub use capture::{
    CapturedFrame, DebugSession, DebugValue, HostProject, SourcePosition, StackFrame,
    VariableExtractor, VariableSnapshot,
};

// Re-export placement and prompt types
pub use placement::{PathResolver, TestFileTarget, TestFileWriter};
pub use prompt::{PromptBuilder, PromptMode};

// Re-export provider and pipeline types
pub use config::GeneratorConfig;
pub use llm::{LlmClient, ProviderError, ProviderKind};
pub use pipeline::{Pipeline, ProgressReporter, RunOutcome, Stage};

// TestFixture is only available in test builds
#[cfg(test)]
pub use testing::TestFixture;
