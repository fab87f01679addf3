//! Facts read from the paused source file's text.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::project::SourceLanguage;

/// Signature used when no enclosing declaration is found.
pub const UNKNOWN_METHOD: &str = "unknown";

/// How far above the paused line the declaration search goes.
pub const METHOD_SEARCH_LINES: u32 = 30;

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"package\s+([\w.]+)").expect("valid package regex"));

static KOTLIN_FUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(private\s+|public\s+|internal\s+)?fun\s+(\w+)\s*\([^)]*\)(\s*:\s*\w+)?")
        .expect("valid kotlin regex")
});

static JAVA_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(private\s+|public\s+|protected\s+|static\s+)*\s*\w+\s+(\w+)\s*\([^)]*\)")
        .expect("valid java regex")
});

static SCALA_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(private\s+|protected\s+)?def\s+(\w+)\s*\([^)]*\)(\s*:\s*\w+)?")
        .expect("valid scala regex")
});

// Statements the Java pattern would otherwise mistake for declarations,
// e.g. `return compute(x)` or `else if (ready)`.
const JAVA_STATEMENT_PREFIXES: &[&str] = &["return ", "new ", "else ", "throw ", "case "];

/// Read the source file, degrading to empty text.
pub fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read source file");
            String::new()
        }
    }
}

/// Extract the declared package, empty for the default package.
pub fn extract_package(text: &str) -> String {
    let package = PACKAGE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    debug!(package = %package, "Extracted package name");
    package
}

/// Find the signature of the method enclosing zero-based `line`.
///
/// Walks upwards from `line` for at most [`METHOD_SEARCH_LINES`] lines and
/// returns the first declaration match, or [`UNKNOWN_METHOD`].
pub fn extract_method_signature(text: &str, line: u32, language: SourceLanguage) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return UNKNOWN_METHOD.to_string();
    }

    let pattern: &Regex = match language {
        SourceLanguage::Kotlin => &KOTLIN_FUN_RE,
        SourceLanguage::Java => &JAVA_METHOD_RE,
        SourceLanguage::Scala => &SCALA_DEF_RE,
    };

    let start = (line as usize).min(lines.len() - 1);
    let stop = (line.saturating_sub(METHOD_SEARCH_LINES)) as usize;

    for idx in (stop..=start).rev() {
        let trimmed = lines[idx].trim();
        if language == SourceLanguage::Java
            && JAVA_STATEMENT_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        {
            continue;
        }
        if let Some(m) = pattern.find(trimmed) {
            debug!(signature = m.as_str(), "Found enclosing method");
            return m.as_str().to_string();
        }
    }

    UNKNOWN_METHOD.to_string()
}
