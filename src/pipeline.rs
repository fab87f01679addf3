//! The capture-to-write run.
//!
//! One [`Pipeline::run`] takes a paused frame through every stage in order:
//!
//! ```text
//! preconditions ─► inspect project ─► extract variables ─► format capture
//!        ─► resolve test file ─► build prompt ─► provider call ─► write
//! ```
//!
//! The cancellation flag is polled between stages and around the provider
//! call. A cancelled run returns [`RunOutcome::Cancelled`] with nothing
//! written; it is an outcome, not an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use dessert::pipeline::{Pipeline, RunOutcome};
//!
//! let pipeline = Pipeline::new(&GeneratorConfig::from_env()?);
//! let cancel = pipeline.cancellation();
//! match pipeline.run(frame, &session, &project).await? {
//!     RunOutcome::Written(path) => println!("Wrote {}", path.display()),
//!     RunOutcome::Cancelled => println!("Cancelled"),
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancellationFlag;
use crate::capture::{
    format_capture, source, CapturedFrame, DebugSession, HostProject, StackFrame,
    VariableExtractor,
};
use crate::config::GeneratorConfig;
use crate::error::{DessertError, Result};
use crate::llm::{build_client, LlmClient, ProviderError};
use crate::placement::{PathResolver, TestFileWriter};
use crate::project::{ProjectInspector, SourceLanguage};
use crate::prompt::PromptBuilder;

// ============================================================================
// Progress
// ============================================================================

/// A step of the run, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Capturing,
    Requesting { provider: String },
    Writing,
    Done,
}

impl Stage {
    /// Completed fraction of the run when this stage starts.
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Preparing => 0.1,
            Self::Capturing => 0.2,
            Self::Requesting { .. } => 0.4,
            Self::Writing => 0.8,
            Self::Done => 1.0,
        }
    }

    /// Status text for the stage.
    pub fn label(&self) -> String {
        match self {
            Self::Preparing => "Preparing debugger data...".to_string(),
            Self::Capturing => "Capturing debugger state...".to_string(),
            Self::Requesting { provider } => {
                format!("Sending request to AI provider ({})...", provider)
            }
            Self::Writing => "Creating test file...".to_string(),
            Self::Done => "Test file ready".to_string(),
        }
    }
}

/// Receives progress from a run.
///
/// [`ProgressReporter::finished`] is called exactly once when the run ends,
/// whether it wrote a file, failed or was cancelled.
pub trait ProgressReporter: Send + Sync {
    fn stage(&self, stage: &Stage);

    fn finished(&self) {}
}

struct FinishGuard<'a>(Option<&'a dyn ProgressReporter>);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if let Some(reporter) = self.0 {
            reporter.finished();
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The generated test was written to this path
    Written(PathBuf),
    /// Cancellation was requested; nothing was written
    Cancelled,
}

/// Generates a test for a paused frame.
pub struct Pipeline {
    client: Arc<dyn LlmClient>,
    cancel: CancellationFlag,
    extractor: VariableExtractor,
    writer: TestFileWriter,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl Pipeline {
    /// Pipeline calling the provider selected by `config`.
    pub fn new(config: &GeneratorConfig) -> Self {
        Self::with_client(Arc::from(build_client(config)))
    }

    /// Pipeline calling `client`.
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            cancel: CancellationFlag::new(),
            extractor: VariableExtractor::new(),
            writer: TestFileWriter::new(),
            reporter: None,
        }
    }

    /// Wait at most `timeout` for the debugger to list variables.
    #[must_use]
    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extractor = self.extractor.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Handle for requesting cancellation from outside the run.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Run once for `frame`.
    ///
    /// # Errors
    ///
    /// - Configuration errors when the session is not paused, the frame has
    ///   no position, the file is not Kotlin, Java or Scala, or the project
    ///   has no base path. These are raised before any work.
    /// - [`DessertError::Provider`] when the provider call fails.
    /// - [`DessertError::Filesystem`] when the test directory or file cannot
    ///   be written.
    ///
    /// No file is written unless the run returns [`RunOutcome::Written`].
    pub async fn run(
        &self,
        frame: Arc<dyn StackFrame>,
        session: &dyn DebugSession,
        project: &dyn HostProject,
    ) -> Result<RunOutcome> {
        let _finish = FinishGuard(self.reporter.as_deref());

        if !session.is_paused() {
            return Err(DessertError::NoPausedSession);
        }
        let position = frame.source_position().ok_or(DessertError::NoStackFrame)?;
        let file_name = position.file_name();
        let language = SourceLanguage::from_file_name(&file_name)
            .ok_or_else(|| DessertError::UnsupportedLanguage {
                file_name: file_name.clone(),
            })?;
        let base_path = project.base_path().ok_or(DessertError::MissingBasePath)?;
        debug!(file = %file_name, language = %language, "Starting run");

        self.report(Stage::Preparing);
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled("preparing"));
        }

        let file_content = source::read_source(&position.path);
        let package_name = source::extract_package(&file_content);
        let context = ProjectInspector::new(&base_path).inspect(package_name);
        debug!(
            build_system = %context.build_system,
            multiplatform = context.is_multiplatform,
            "Inspected project"
        );
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled("inspecting project"));
        }

        self.report(Stage::Capturing);
        let variables = self.extractor.extract(frame).await;
        let captured = CapturedFrame::new(&position, language, file_content, variables);
        let capture = format_capture(&captured, &context);
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled("capturing"));
        }

        let resolver = PathResolver::new(&base_path, context.build_system)
            .multiplatform(context.is_multiplatform);
        let target = resolver.resolve(&position.path, language)?;
        let prompt = PromptBuilder::new(language, context.build_system, &context.package_name)
            .build(&capture, target.existing_content.as_deref());

        self.report(Stage::Requesting {
            provider: self.client.provider_name().to_string(),
        });
        let generated = match self.client.generate(&prompt, &self.cancel).await {
            Ok(text) => text,
            Err(ProviderError::Cancelled) => return Ok(self.cancelled("requesting")),
            Err(e) => {
                warn!(
                    provider = self.client.provider_name(),
                    model = self.client.model_name(),
                    status = ?e.status(),
                    "Provider call failed"
                );
                return Err(e.into());
            }
        };
        if self.cancel.is_cancelled() {
            return Ok(self.cancelled("writing"));
        }
        if generated.trim().is_empty() {
            warn!(
                provider = self.client.provider_name(),
                "Provider returned no text, keeping the test file as is"
            );
            return Err(ProviderError::EmptyResponse {
                provider: self.client.provider_name().to_string(),
                body: String::new(),
            }
            .into());
        }

        self.report(Stage::Writing);
        let path = self.writer.write(&target.absolute_path, &generated)?;

        self.report(Stage::Done);
        info!(path = %path.display(), "Generated test");
        Ok(RunOutcome::Written(path))
    }

    fn report(&self, stage: Stage) {
        debug!(fraction = stage.fraction(), "{}", stage.label());
        if let Some(ref reporter) = self.reporter {
            reporter.stage(&stage);
        }
    }

    fn cancelled(&self, during: &str) -> RunOutcome {
        info!(during, "Run cancelled");
        RunOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::testing::{MockProject, MockSession, MockStackFrame, MockValue, TestFixture};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        stages: Mutex<Vec<Stage>>,
        finished: Mutex<u32>,
    }

    impl ProgressReporter for RecordingReporter {
        fn stage(&self, stage: &Stage) {
            self.stages.lock().unwrap().push(stage.clone());
        }

        fn finished(&self) {
            *self.finished.lock().unwrap() += 1;
        }
    }

    fn kotlin_fixture() -> (TestFixture, PathBuf) {
        let fixture = TestFixture::gradle_project();
        let source = fixture.write(
            "app/src/main/kotlin/com/example/Cart.kt",
            "package com.example\n\nclass Cart {\n    fun total(items: List<Int>): Int {\n        return items.sum()\n    }\n}\n",
        );
        (fixture, source)
    }

    #[tokio::test]
    async fn test_run_writes_generated_text() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new().with_response("package com.example\n\nclass CartTest"));
        let pipeline = Pipeline::with_client(client.clone());

        let frame = MockStackFrame::new(&source, 4).with_variable("items", MockValue::text("[1, 2]"));
        let outcome = pipeline
            .run(Arc::new(frame), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap();

        let expected = fixture
            .path()
            .join("app/src/test/kotlin/generated/CartTest.kt");
        assert_eq!(outcome, RunOutcome::Written(expected.clone()));
        assert_eq!(
            std::fs::read_to_string(expected).unwrap(),
            "package com.example\n\nclass CartTest"
        );

        let prompt = &client.prompts()[0];
        assert!(prompt.starts_with("Please create unit test(s) in Kotlin"));
        assert!(prompt.contains("    items = \"[1, 2]\""));
        assert!(prompt.contains("  Method: fun total(items: List<Int>): Int"));
        assert!(prompt.contains("BUILD GRADLE CONTENT:"));
        assert!(prompt.ends_with("package com.example"));
    }

    #[tokio::test]
    async fn test_blank_generated_text_keeps_existing_test() {
        let (fixture, source) = kotlin_fixture();
        let existing = fixture.write(
            "app/src/test/kotlin/generated/CartTest.kt",
            "class CartTest { fun old() {} }",
        );
        let client = Arc::new(MockLlmClient::new().with_response("   \n"));
        let pipeline = Pipeline::with_client(client.clone());

        let err = pipeline
            .run(
                Arc::new(MockStackFrame::new(&source, 4)),
                &MockSession::paused(),
                &MockProject::at(fixture.path()),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DessertError::Provider(ProviderError::EmptyResponse { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(existing).unwrap(),
            "class CartTest { fun old() {} }"
        );
    }

    #[tokio::test]
    async fn test_existing_test_switches_to_extend() {
        let (fixture, source) = kotlin_fixture();
        fixture.write(
            "app/src/test/kotlin/generated/CartTest.kt",
            "class CartTest { fun old() {} }",
        );
        let client = Arc::new(MockLlmClient::new().with_response("merged"));
        let pipeline = Pipeline::with_client(client.clone());

        pipeline
            .run(
                Arc::new(MockStackFrame::new(&source, 4)),
                &MockSession::paused(),
                &MockProject::at(fixture.path()),
            )
            .await
            .unwrap();

        assert!(client.prompts()[0].contains("EXISTING TEST FILE CONTENT:\nclass CartTest { fun old() {} }"));
        assert_eq!(
            fixture.read("app/src/test/kotlin/generated/CartTest.kt").as_deref(),
            Some("merged")
        );
    }

    #[tokio::test]
    async fn test_preconditions_fail_before_provider_call() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new());
        let pipeline = Pipeline::with_client(client.clone());
        let project = MockProject::at(fixture.path());

        let err = pipeline
            .run(Arc::new(MockStackFrame::new(&source, 0)), &MockSession::running(), &project)
            .await
            .unwrap_err();
        assert!(matches!(err, DessertError::NoPausedSession));

        let err = pipeline
            .run(Arc::new(MockStackFrame::without_position()), &MockSession::paused(), &project)
            .await
            .unwrap_err();
        assert!(matches!(err, DessertError::NoStackFrame));

        let err = pipeline
            .run(
                Arc::new(MockStackFrame::new(fixture.path().join("notes.txt"), 0)),
                &MockSession::paused(),
                &project,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DessertError::UnsupportedLanguage { .. }));

        let err = pipeline
            .run(
                Arc::new(MockStackFrame::new(&source, 0)),
                &MockSession::paused(),
                &MockProject::without_base_path(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DessertError::MissingBasePath));

        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_run_writes_nothing() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new().with_response("x"));
        let pipeline = Pipeline::with_client(client.clone());
        pipeline.cancellation().cancel();

        let outcome = pipeline
            .run(Arc::new(MockStackFrame::new(&source, 0)), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(client.call_count(), 0);
        assert!(fixture.read("app/src/test/kotlin/generated/CartTest.kt").is_none());
    }

    #[tokio::test]
    async fn test_cancel_during_request_writes_nothing() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new().with_response("x").cancelling_in_flight());
        let pipeline = Pipeline::with_client(client.clone());

        let outcome = pipeline
            .run(Arc::new(MockStackFrame::new(&source, 0)), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(client.call_count(), 1);
        assert!(fixture.read("app/src/test/kotlin/generated/CartTest.kt").is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_writes_nothing() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new().with_provider_error(ProviderError::Http {
            provider: "Claude".into(),
            status: 500,
            body: "boom".into(),
        }));
        let pipeline = Pipeline::with_client(client);

        let err = pipeline
            .run(Arc::new(MockStackFrame::new(&source, 0)), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap_err();

        match err {
            DessertError::Provider(ref e) => assert_eq!(e.status(), Some(500)),
            other => panic!("unexpected error: {other}"),
        }
        assert!(fixture.read("app/src/test/kotlin/generated/CartTest.kt").is_none());
    }

    #[tokio::test]
    async fn test_timeout_with_no_variables_still_requests() {
        let (fixture, source) = kotlin_fixture();
        let client = Arc::new(MockLlmClient::new().with_response("class CartTest"));
        let pipeline = Pipeline::with_client(client.clone())
            .with_extraction_timeout(Duration::from_millis(100));

        let frame = MockStackFrame::new(&source, 4).never_completes();
        let outcome = pipeline
            .run(Arc::new(frame), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Written(_)));
        assert!(client.prompts()[0].contains("  Variables: <none captured>"));
    }

    #[tokio::test]
    async fn test_reporter_sees_stages_and_finish() {
        let (fixture, source) = kotlin_fixture();
        let reporter = Arc::new(RecordingReporter::default());
        let pipeline = Pipeline::with_client(Arc::new(MockLlmClient::new().with_response("x")))
            .with_reporter(reporter.clone());

        pipeline
            .run(Arc::new(MockStackFrame::new(&source, 0)), &MockSession::paused(), &MockProject::at(fixture.path()))
            .await
            .unwrap();

        let stages = reporter.stages.lock().unwrap().clone();
        assert_eq!(
            stages,
            vec![
                Stage::Preparing,
                Stage::Capturing,
                Stage::Requesting {
                    provider: "Mock".into()
                },
                Stage::Writing,
                Stage::Done,
            ]
        );
        let fractions: Vec<f64> = stages.iter().map(Stage::fraction).collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reporter.finished.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reporter_finished_on_error() {
        let reporter = Arc::new(RecordingReporter::default());
        let pipeline = Pipeline::with_client(Arc::new(MockLlmClient::new()))
            .with_reporter(reporter.clone());

        let _ = pipeline
            .run(
                Arc::new(MockStackFrame::new("/p/A.kt", 0)),
                &MockSession::running(),
                &MockProject::at("/p"),
            )
            .await;
        assert_eq!(*reporter.finished.lock().unwrap(), 1);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Preparing.label(), "Preparing debugger data...");
        assert_eq!(
            Stage::Requesting {
                provider: "Gemini".into()
            }
            .label(),
            "Sending request to AI provider (Gemini)..."
        );
    }
}
