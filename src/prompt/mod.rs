//! Prompt assembly.
//!
//! Wraps the capture block in one of two fixed instruction templates:
//! "extend" when a generated test already exists with content, "create"
//! otherwise. The text is provider-agnostic.
//!
//! # Example
//!
//! ```
//! use dessert::prompt::{PromptBuilder, PromptMode};
//! use dessert::{BuildSystem, SourceLanguage};
//!
//! let builder = PromptBuilder::new(SourceLanguage::Kotlin, BuildSystem::Gradle, "com.example");
//! let prompt = builder.build("=== DEBUGGER CAPTURE ===", None);
//! assert_eq!(PromptBuilder::mode_for(None), PromptMode::Create);
//! assert!(prompt.contains("package com.example"));
//! ```

pub mod templates;

use tracing::debug;

use crate::project::{BuildSystem, SourceLanguage};
use templates::{package_line, NOTICE, PLAIN_TEXT_ONLY};

/// Which instruction template a prompt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Write a new test class
    Create,
    /// Add tests to the existing generated class
    Extend,
}

/// Builds the generation prompt for one run.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: SourceLanguage,
    build_system: BuildSystem,
    package_name: String,
}

impl PromptBuilder {
    pub fn new(
        language: SourceLanguage,
        build_system: BuildSystem,
        package_name: impl Into<String>,
    ) -> Self {
        Self {
            language,
            build_system,
            package_name: package_name.into(),
        }
    }

    /// Extend if and only if there is non-empty existing content.
    pub fn mode_for(existing: Option<&str>) -> PromptMode {
        match existing {
            Some(content) if !content.is_empty() => PromptMode::Extend,
            _ => PromptMode::Create,
        }
    }

    /// Build the prompt around `capture`, extending `existing` when present.
    #[must_use]
    pub fn build(&self, capture: &str, existing: Option<&str>) -> String {
        let mode = Self::mode_for(existing);
        debug!(?mode, language = %self.language, "Building prompt");

        let body = match (mode, existing) {
            (PromptMode::Extend, Some(existing)) => format!(
                "Please extend the existing test class with new unit test(s) in {} for the method shown in Frame 0\n\
                 \n\
                 EXISTING TEST FILE CONTENT:\n\
                 {}\n\
                 \n\
                 NEW DEBUGGER OUTPUT TO ADD:\n\
                 {}",
                self.language, existing, capture
            ),
            _ => format!(
                "Please create unit test(s) in {} for the method shown in Frame 0\n\
                 \n\
                 Debugger Output:\n\
                 {}",
                self.language, capture
            ),
        };

        format!(
            "{}\n\nBUILD SYSTEM CONTEXT:\n{}\n\n{}\n{}\n{}",
            body.trim_end(),
            self.build_system.testing_hint(),
            NOTICE,
            PLAIN_TEXT_ONLY,
            package_line(&self.package_name)
        )
    }
}
