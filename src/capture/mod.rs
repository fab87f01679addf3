//! Debug-context capture.
//!
//! - [`frame`] - collaborator traits the debugger host implements
//! - [`extractor`] - timeout-safe variable extraction
//! - [`source`] - package and enclosing-method lookup in the source text
//! - [`formatter`] - the capture block sent to the model

pub mod extractor;
pub mod formatter;
pub mod frame;
pub mod source;

pub use extractor::{
    render_value, ExtractionOutcome, Variable, VariableExtractor, VariableSnapshot,
    COULD_NOT_EXTRACT, DEFAULT_EXTRACTION_TIMEOUT, EXTRACTION_ERROR, MAX_VALUE_CHARS,
    MAX_VARIABLES,
};
pub use formatter::format_capture;
pub use frame::{
    Child, ChildrenNode, DebugSession, DebugValue, EnumerationEnd, HostProject, SourcePosition,
    StackFrame,
};

use crate::project::SourceLanguage;

/// Everything captured from one paused frame.
///
/// Built once per run and dropped after the prompt is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub source_file_name: String,
    /// Zero-based, as reported by the debugger
    pub source_line: u32,
    pub language: SourceLanguage,
    pub method_signature: String,
    /// Extraction order, at most [`MAX_VARIABLES`] entries, receiver excluded
    pub variables: Vec<Variable>,
    /// Full source text at capture time, empty when unreadable
    pub file_content: String,
}

impl CapturedFrame {
    /// Assemble a capture from the frame position, its source text and the
    /// extracted variables.
    pub fn new(
        position: &SourcePosition,
        language: SourceLanguage,
        file_content: String,
        variables: VariableSnapshot,
    ) -> Self {
        let method_signature =
            source::extract_method_signature(&file_content, position.line, language);
        Self {
            source_file_name: position.file_name(),
            source_line: position.line,
            language,
            method_signature,
            variables: variables.variables,
            file_content,
        }
    }
}
