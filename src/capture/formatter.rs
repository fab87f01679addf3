//! Renders a captured frame and its project context as one text block.
//!
//! The output is a pure function of its inputs: no clocks, no hash-ordered
//! collections. Sections appear in a fixed order and empty optional
//! sections are omitted.

use std::fmt::Write as _;

use super::CapturedFrame;
use crate::project::ProjectContext;

/// Lines of the build descriptor included in the capture.
pub const BUILD_EXCERPT_LINES: usize = 50;

/// Lines of the source file included in the capture.
pub const SOURCE_EXCERPT_LINES: usize = 100;

/// Shown in place of the variable list when nothing was captured.
pub const NO_VARIABLES_PLACEHOLDER: &str = "<none captured>";

/// Format `frame` and `project` into the capture block sent to the model.
///
/// # Example
///
/// ```rust,ignore
/// let block = format_capture(&frame, &project);
/// assert!(block.starts_with("=== DEBUGGER CAPTURE ==="));
/// ```
pub fn format_capture(frame: &CapturedFrame, project: &ProjectContext) -> String {
    let mut out = String::new();
    let location = format!("{}:{}", frame.source_file_name, frame.source_line);

    // Writing to a String cannot fail.
    let _ = writeln!(out, "=== DEBUGGER CAPTURE ===");
    let _ = writeln!(out, "Current Location: {}", location);
    let _ = writeln!(out, "Source Language: {}", frame.language);
    let _ = writeln!(out, "Build System: {}", project.build_system);
    out.push('\n');

    if !project.build_descriptor.is_empty() {
        let _ = writeln!(out, "{}:", project.build_system.descriptor_label());
        let _ = writeln!(out, "====================");
        for line in project.build_descriptor.lines().take(BUILD_EXCERPT_LINES) {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "EXECUTION INFO:");
    let _ = writeln!(out, "===============");
    let _ = writeln!(out, "Frame 0:");
    let _ = writeln!(out, "  File: {}", location);
    let _ = writeln!(out, "  Method: {}", frame.method_signature);

    if frame.variables.is_empty() {
        let _ = writeln!(out, "  Variables: {}", NO_VARIABLES_PLACEHOLDER);
    } else {
        let _ = writeln!(out, "  Variables:");
        for variable in &frame.variables {
            let _ = writeln!(out, "    {} = {}", variable.name, variable.value);
        }
    }

    if !frame.file_content.is_empty() {
        let rule = "=".repeat(50);
        let _ = writeln!(out, "  File Content:");
        let _ = writeln!(out, "  {}", rule);
        for line in frame.file_content.lines().take(SOURCE_EXCERPT_LINES) {
            let _ = writeln!(out, "{}", line);
        }
        let _ = writeln!(out, "  {}", rule);
    }

    out
}
