//! Mock implementations of the debugger host contracts.
//!
//! These mocks provide controllable stand-ins for a paused frame, its session
//! and the open project, so capture and pipeline behaviour can be tested
//! without a live debugger.

use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{
    Child, ChildrenNode, DebugSession, DebugValue, HostProject, SourcePosition, StackFrame,
};

/// Mock debugger value.
///
/// # Example
///
/// ```rust,ignore
/// let ok = MockValue::text("42");
/// let broken = MockValue::failing("vm disconnected");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockValue {
    /// Computes to the given text
    Text(String),
    /// Has no computable text
    Opaque,
    /// Computation fails with the given message
    Failing(String),
}

impl MockValue {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn failing(message: &str) -> Self {
        Self::Failing(message.to_string())
    }
}

impl DebugValue for MockValue {
    fn compute_value(&self) -> std::result::Result<Option<String>, String> {
        match self {
            Self::Text(text) => Ok(Some(text.clone())),
            Self::Opaque => Ok(None),
            Self::Failing(message) => Err(message.clone()),
        }
    }
}

/// Mock paused stack frame.
///
/// Delivers its variables in order, in batches, on whichever thread calls
/// [`StackFrame::compute_children`].
///
/// # Example
///
/// ```rust,ignore
/// let frame = MockStackFrame::new("/proj/src/main/kotlin/Cart.kt", 12)
///     .with_variable("items", MockValue::text("[a, b]"))
///     .with_batch_size(1)
///     .never_completes();
/// ```
#[derive(Debug, Clone)]
pub struct MockStackFrame {
    position: Option<SourcePosition>,
    variables: Vec<(String, MockValue)>,
    batch_size: usize,
    completes: bool,
    delay: Option<Duration>,
    error: Option<String>,
}

impl MockStackFrame {
    /// Create a frame paused at zero-based `line` of `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            position: Some(SourcePosition::new(path, line)),
            variables: Vec::new(),
            batch_size: usize::MAX,
            completes: true,
            delay: None,
            error: None,
        }
    }

    /// A frame whose position the debugger cannot report.
    #[must_use]
    pub fn without_position() -> Self {
        Self {
            position: None,
            ..Self::new("", 0)
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, value: MockValue) -> Self {
        self.variables.push((name.to_string(), value));
        self
    }

    /// Deliver variables `size` at a time instead of in one batch.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Never flag the last batch, as a hung debugger would.
    #[must_use]
    pub fn never_completes(mut self) -> Self {
        self.completes = false;
        self
    }

    /// Block the enumerating thread before delivering anything.
    #[must_use]
    pub fn blocks_for(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report an enumeration error instead of variables.
    #[must_use]
    pub fn fails_with(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }
}

impl StackFrame for MockStackFrame {
    fn source_position(&self) -> Option<SourcePosition> {
        self.position.clone()
    }

    fn compute_children(&self, node: ChildrenNode) {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if let Some(ref message) = self.error {
            node.set_error_message(message);
            return;
        }

        if self.variables.is_empty() {
            if self.completes {
                node.add_children(Vec::new(), true);
            }
            return;
        }

        let batches: Vec<_> = self.variables.chunks(self.batch_size).collect();
        let count = batches.len();
        for (idx, batch) in batches.into_iter().enumerate() {
            let children = batch
                .iter()
                .map(|(name, value)| Child::new(name.clone(), value.clone()))
                .collect();
            node.add_children(children, self.completes && idx + 1 == count);
        }
    }
}

/// Mock debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSession {
    paused: bool,
}

impl MockSession {
    #[must_use]
    pub fn paused() -> Self {
        Self { paused: true }
    }

    #[must_use]
    pub fn running() -> Self {
        Self { paused: false }
    }
}

impl DebugSession for MockSession {
    fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Mock host project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockProject {
    base_path: Option<PathBuf>,
}

impl MockProject {
    #[must_use]
    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(base_path.into()),
        }
    }

    /// A project with no base path, e.g. the default project.
    #[must_use]
    pub fn without_base_path() -> Self {
        Self::default()
    }
}

impl HostProject for MockProject {
    fn base_path(&self) -> Option<PathBuf> {
        self.base_path.clone()
    }
}
