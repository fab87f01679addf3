//! Source languages a test can be generated for.
//!
//! # Example
//!
//! ```rust
//! use dessert::SourceLanguage;
//!
//! assert_eq!(SourceLanguage::Kotlin.extension(), "kt");
//! assert_eq!(SourceLanguage::from_file_name("Foo.java"), Some(SourceLanguage::Java));
//!
//! let lang: SourceLanguage = "scala".parse().unwrap();
//! assert_eq!(lang, SourceLanguage::Scala);
//! assert_eq!(format!("{}", SourceLanguage::Kotlin), "Kotlin");
//! ```

use std::fmt;
use std::str::FromStr;

/// The JVM languages recognised in a paused frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SourceLanguage {
    /// Kotlin (`.kt`)
    Kotlin,
    /// Java (`.java`)
    Java,
    /// Scala (`.scala`)
    Scala,
}

static ALL_LANGUAGES: &[SourceLanguage] = &[
    SourceLanguage::Kotlin,
    SourceLanguage::Java,
    SourceLanguage::Scala,
];

impl SourceLanguage {
    /// Returns all supported languages.
    pub fn all() -> &'static [SourceLanguage] {
        ALL_LANGUAGES
    }

    /// File extension without the leading dot.
    pub const fn extension(&self) -> &'static str {
        match self {
            SourceLanguage::Kotlin => "kt",
            SourceLanguage::Java => "java",
            SourceLanguage::Scala => "scala",
        }
    }

    /// Suffix appended to the source base name to form the test class name.
    pub const fn test_suffix(&self) -> &'static str {
        match self {
            SourceLanguage::Kotlin | SourceLanguage::Java | SourceLanguage::Scala => "Test",
        }
    }

    /// Directory name used under `src/main/` and `src/test/`.
    pub const fn source_dir(&self) -> &'static str {
        match self {
            SourceLanguage::Kotlin => "kotlin",
            SourceLanguage::Java => "java",
            SourceLanguage::Scala => "scala",
        }
    }

    /// The `/src/main/<lang>/` marker that separates a module root from the
    /// package path.
    pub fn source_root_marker(&self) -> String {
        format!("/src/main/{}/", self.source_dir())
    }

    /// Detect the language from a file name by its extension.
    ///
    /// Returns `None` for anything other than `.kt`, `.java` and `.scala`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        ALL_LANGUAGES
            .iter()
            .copied()
            .find(|lang| file_name.ends_with(&format!(".{}", lang.extension())))
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceLanguage::Kotlin => "Kotlin",
            SourceLanguage::Java => "Java",
            SourceLanguage::Scala => "Scala",
        };
        write!(f, "{}", name)
    }
}

/// Error returned when parsing an unknown language name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown source language: '{0}'. Valid options: kotlin, java, scala")]
pub struct ParseSourceLanguageError(String);

impl FromStr for SourceLanguage {
    type Err = ParseSourceLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kotlin" | "kt" => Ok(SourceLanguage::Kotlin),
            "java" => Ok(SourceLanguage::Java),
            "scala" => Ok(SourceLanguage::Scala),
            _ => Err(ParseSourceLanguageError(s.to_string())),
        }
    }
}
