//! Destination of the generated test file.
//!
//! Resolution depends on the build system and module layout:
//!
//! - Bazel: `<source dir>/generated`, colocated with the source package
//! - Kotlin Multiplatform: `<root>/shared/src/<xTest>/kotlin/generated`,
//!   where `xTest` mirrors the source set the file lives in
//! - Everything else: `<module>/src/test/<lang>/generated`, the module being
//!   whatever precedes `/src/main/<lang>/` in the source path, or the project
//!   root when the marker is absent
//!
//! The file is named `<Base>Test.<ext>`. Paths are recomputed on every call;
//! the filesystem is the only source of truth.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DessertError, Result};
use crate::project::{BuildSystem, SourceLanguage};

/// Directory that separates generated tests from hand-written ones.
pub const GENERATED_DIR: &str = "generated";

/// Source-set tags of a multiplatform module, checked in order, with the
/// test source set each maps to.
pub const SOURCE_SET_TAGS: &[(&str, &str)] = &[
    ("desktopMain", "desktopTest"),
    ("androidMain", "androidTest"),
    ("iosMain", "iosTest"),
    ("jvmMain", "jvmTest"),
    ("jsMain", "jsTest"),
    ("commonMain", "commonTest"),
];

/// Test source set used when a multiplatform path carries no known tag.
pub const DEFAULT_TEST_SOURCE_SET: &str = "commonTest";

/// Where the generated test goes and what is already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFileTarget {
    pub absolute_path: PathBuf,
    /// Current file content, `None` when the file is absent or unreadable
    pub existing_content: Option<String>,
}

impl TestFileTarget {
    /// Whether the prompt should extend an existing test.
    pub fn has_existing_content(&self) -> bool {
        self.existing_content
            .as_deref()
            .is_some_and(|content| !content.is_empty())
    }
}

/// Computes generated-test locations for one project.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    build_system: BuildSystem,
    is_multiplatform: bool,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, build_system: BuildSystem) -> Self {
        Self {
            root: root.into(),
            build_system,
            is_multiplatform: false,
        }
    }

    /// Mark the project as a Kotlin Multiplatform layout.
    #[must_use]
    pub fn multiplatform(mut self, is_multiplatform: bool) -> Self {
        self.is_multiplatform = is_multiplatform;
        self
    }

    /// Compute the test directory for `source` without touching the disk.
    pub fn test_dir(&self, source: &Path, language: SourceLanguage) -> PathBuf {
        let normalized = normalize(source);

        if self.build_system == BuildSystem::Bazel {
            let dir = self.bazel_test_dir(&normalized);
            debug!(dir = %dir.display(), "Resolved Bazel test directory");
            return dir;
        }

        if self.is_multiplatform && language == SourceLanguage::Kotlin {
            let source_set = test_source_set(&normalized);
            let dir = self
                .root
                .join("shared")
                .join("src")
                .join(source_set)
                .join(language.source_dir())
                .join(GENERATED_DIR);
            debug!(dir = %dir.display(), source_set, "Resolved multiplatform test directory");
            return dir;
        }

        let marker = language.source_root_marker();
        // A marker at the very start leaves no module prefix; use the root.
        let module_root = match normalized.find(&marker) {
            Some(idx) if idx > 0 => PathBuf::from(&normalized[..idx]),
            _ => {
                debug!(
                    source = %normalized,
                    marker = %marker,
                    "No module prefix before source root marker, using project root"
                );
                self.root.clone()
            }
        };
        module_root
            .join("src")
            .join("test")
            .join(language.source_dir())
            .join(GENERATED_DIR)
    }

    /// Compute the test file path for `source` without touching the disk.
    pub fn test_file_path(&self, source: &Path, language: SourceLanguage) -> PathBuf {
        self.test_dir(source, language)
            .join(test_file_name(source, language))
    }

    /// Resolve the target for `source`, creating the test directory.
    ///
    /// # Errors
    ///
    /// Returns [`DessertError::Filesystem`] if the test directory cannot be
    /// created. An unreadable existing file only loses its content.
    pub fn resolve(&self, source: &Path, language: SourceLanguage) -> Result<TestFileTarget> {
        let dir = self.test_dir(source, language);
        std::fs::create_dir_all(&dir).map_err(|e| DessertError::filesystem(&dir, e))?;

        let absolute_path = dir.join(test_file_name(source, language));
        let existing_content = if absolute_path.exists() {
            match std::fs::read_to_string(&absolute_path) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(
                        path = %absolute_path.display(),
                        error = %e,
                        "Could not read existing test file, treating it as new"
                    );
                    None
                }
            }
        } else {
            None
        };

        debug!(
            path = %absolute_path.display(),
            existing = existing_content.is_some(),
            "Resolved test file"
        );
        Ok(TestFileTarget {
            absolute_path,
            existing_content,
        })
    }

    fn bazel_test_dir(&self, normalized: &str) -> PathBuf {
        let root = normalize(&self.root);
        let root = root.trim_end_matches('/');
        let relative = normalized
            .strip_prefix(root)
            .filter(|rest| rest.starts_with('/'))
            .map(|rest| rest.trim_start_matches('/'));

        let source_dir = match relative {
            Some(rel) => self
                .root
                .join(Path::new(rel).parent().unwrap_or_else(|| Path::new(""))),
            // Outside the project: stay next to the source.
            None => Path::new(normalized)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
        };
        source_dir.join(GENERATED_DIR)
    }
}

/// `<Base>Test.<ext>` for `source`.
pub fn test_file_name(source: &Path, language: SourceLanguage) -> String {
    let normalized = normalize(source);
    let file_name = normalized.rsplit('/').next().unwrap_or_default();
    let base = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}.{}", base, language.test_suffix(), language.extension())
}

/// Map the source-set tag in a multiplatform path to its test source set.
pub fn test_source_set(normalized_source: &str) -> &'static str {
    SOURCE_SET_TAGS
        .iter()
        .find(|(main, _)| normalized_source.contains(&format!("/{}/", main)))
        .map(|(_, test)| *test)
        .unwrap_or_else(|| {
            debug!(
                source = normalized_source,
                "No source set tag in path, using {}", DEFAULT_TEST_SOURCE_SET
            );
            DEFAULT_TEST_SOURCE_SET
        })
}

fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
