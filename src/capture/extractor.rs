//! Bounded, time-limited snapshot of a frame's local variables.
//!
//! Live value computation can hang (lazy or remote values), so enumeration
//! runs on its own thread and the extractor waits for completion with a
//! deadline. On timeout it returns whatever was collected so far.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::frame::{ChildrenNode, Collector, DebugValue, EnumerationEnd, StackFrame};

/// Default wait for the debugger to finish enumerating children.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Maximum number of variables kept from one frame.
pub const MAX_VARIABLES: usize = 20;

/// Maximum characters kept from one rendered value.
pub const MAX_VALUE_CHARS: usize = 200;

/// Placeholder for a value with no computable text.
pub const COULD_NOT_EXTRACT: &str = "<could not extract>";

/// Placeholder for a value whose computation failed.
pub const EXTRACTION_ERROR: &str = "<extraction error>";

/// One captured local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// How the extraction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Completed,
    TooManyChildren { remaining: usize },
    Failed(String),
    TimedOut,
}

/// Variables captured from a frame, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSnapshot {
    pub variables: Vec<Variable>,
    pub outcome: ExtractionOutcome,
}

impl VariableSnapshot {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }
}

/// Reads locals from a live frame under a deadline.
#[derive(Debug, Clone)]
pub struct VariableExtractor {
    timeout: Duration,
    max_variables: usize,
    max_value_chars: usize,
}

impl Default for VariableExtractor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
            max_variables: MAX_VARIABLES,
            max_value_chars: MAX_VALUE_CHARS,
        }
    }
}

impl VariableExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Enumerate `frame`'s children, waiting at most the configured timeout.
    ///
    /// Never fails: enumeration errors and timeouts are reported through
    /// [`VariableSnapshot::outcome`] alongside the partial variables.
    pub async fn extract(&self, frame: Arc<dyn StackFrame>) -> VariableSnapshot {
        let collector = Collector::new(self.max_variables, self.max_value_chars);
        let node = ChildrenNode::new(collector.clone());

        // Detached on purpose: a frame that blocks forever must not hold up
        // the pipeline or process exit.
        let spawned = std::thread::Builder::new()
            .name("dessert-frame-children".to_string())
            .spawn(move || frame.compute_children(node));
        if let Err(e) = spawned {
            warn!(error = %e, "Could not start variable enumeration");
            return VariableSnapshot {
                variables: Vec::new(),
                outcome: ExtractionOutcome::Failed(e.to_string()),
            };
        }

        let outcome = match tokio::time::timeout(self.timeout, collector.wait()).await {
            Ok(()) => match collector.end() {
                Some(EnumerationEnd::TooManyChildren { remaining }) => {
                    ExtractionOutcome::TooManyChildren { remaining }
                }
                Some(EnumerationEnd::Failed(message)) => {
                    warn!(error = %message, "Debugger reported an error while listing variables");
                    ExtractionOutcome::Failed(message)
                }
                Some(EnumerationEnd::Completed) | None => ExtractionOutcome::Completed,
            },
            Err(_) => {
                warn!(
                    "Variable extraction timed out after {:?}, keeping partial results",
                    self.timeout
                );
                ExtractionOutcome::TimedOut
            }
        };

        let variables: Vec<Variable> = collector
            .snapshot()
            .into_iter()
            .map(|(name, value)| Variable { name, value })
            .collect();
        debug!(count = variables.len(), ?outcome, "Extracted frame variables");

        VariableSnapshot { variables, outcome }
    }
}

/// Render a debugger value for the capture block.
///
/// Text longer than `max_chars` is cut and marked with `...`; the result is
/// quoted unless it already starts and ends with a quote. Failures degrade
/// to a placeholder.
pub fn render_value(value: &dyn DebugValue, name: &str, max_chars: usize) -> String {
    match value.compute_value() {
        Ok(Some(text)) => {
            let limited = if text.chars().count() > max_chars {
                let cut: String = text.chars().take(max_chars).collect();
                format!("{}...", cut)
            } else {
                text
            };
            if limited.starts_with('"') && limited.ends_with('"') {
                limited
            } else {
                format!("\"{}\"", limited)
            }
        }
        Ok(None) => COULD_NOT_EXTRACT.to_string(),
        Err(e) => {
            warn!(variable = name, error = %e, "Failed to extract value");
            EXTRACTION_ERROR.to_string()
        }
    }
}
