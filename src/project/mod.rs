//! Host project facts: source language, build system and layout.
//!
//! - [`language`] - the three recognised JVM source languages
//! - [`build_system`] - marker-file build system detection
//! - [`inspector`] - multiplatform detection and build descriptor reading

pub mod build_system;
pub mod inspector;
pub mod language;

pub use build_system::BuildSystem;
pub use inspector::{ProjectContext, ProjectInspector, MULTIPLATFORM_MARKER};
pub use language::{ParseSourceLanguageError, SourceLanguage};
