//! Filesystem inspection of the host project.
//!
//! Everything here is a pure predicate over the project root, so tests
//! exercise it against temporary directory fixtures without a debugger.
//!
//! # Example
//!
//! ```rust,ignore
//! use dessert::project::ProjectInspector;
//!
//! let inspector = ProjectInspector::new("/path/to/project");
//! let build_system = inspector.build_system();
//! let descriptor = inspector.build_descriptor(build_system);
//! if inspector.is_multiplatform() {
//!     println!("Kotlin Multiplatform layout");
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::build_system::BuildSystem;

/// Token in a build descriptor that marks a multiplatform module.
pub const MULTIPLATFORM_MARKER: &str = "multiplatform";

/// Everything the pipeline knows about the host project for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Project root on disk
    pub base_path: PathBuf,
    /// Detected build system
    pub build_system: BuildSystem,
    /// Build descriptor text, empty when unreadable or absent
    pub build_descriptor: String,
    /// Whether the project is a multi-target (Kotlin Multiplatform) layout
    pub is_multiplatform: bool,
    /// Package of the paused source file, empty for the default package
    pub package_name: String,
}

/// Reads build-system facts from a project root.
#[derive(Debug, Clone)]
pub struct ProjectInspector {
    root: PathBuf,
}

impl ProjectInspector {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Detect the build system. See [`BuildSystem::detect`].
    pub fn build_system(&self) -> BuildSystem {
        BuildSystem::detect(&self.root)
    }

    /// Check for a Kotlin Multiplatform layout.
    ///
    /// Requires a `shared/` directory. Then either signal is enough: the
    /// shared module's descriptor (or the root one as a fallback) mentions
    /// `multiplatform`, or `shared/src/commonTest` exists.
    pub fn is_multiplatform(&self) -> bool {
        let shared = self.root.join("shared");
        if !shared.is_dir() {
            return false;
        }

        let shared_build = shared.join("build.gradle.kts");
        let root_build = self.root.join("build.gradle.kts");
        let descriptor = if shared_build.exists() {
            read_or_empty(&shared_build)
        } else if root_build.exists() {
            read_or_empty(&root_build)
        } else {
            String::new()
        };

        let declares_multiplatform = descriptor.contains(MULTIPLATFORM_MARKER);
        let has_common_test = shared.join("src").join("commonTest").is_dir();

        debug!(
            declares_multiplatform,
            has_common_test, "Multiplatform detection"
        );
        declares_multiplatform || has_common_test
    }

    /// Names of the descriptor files [`Self::build_descriptor`] would read.
    pub fn descriptor_files(&self, build_system: BuildSystem) -> Vec<PathBuf> {
        let first_existing = |names: &[&str]| {
            names
                .iter()
                .map(|name| self.root.join(name))
                .find(|path| path.exists())
        };

        match build_system {
            BuildSystem::Gradle => first_existing(&["build.gradle.kts", "build.gradle"])
                .into_iter()
                .collect(),
            BuildSystem::Maven => first_existing(&["pom.xml"]).into_iter().collect(),
            BuildSystem::Sbt => first_existing(&["build.sbt"]).into_iter().collect(),
            BuildSystem::Bazel => [
                first_existing(&["WORKSPACE.bazel", "WORKSPACE"]),
                first_existing(&["BUILD.bazel", "BUILD"]),
                first_existing(&[".bazelproject"]),
            ]
            .into_iter()
            .flatten()
            .collect(),
            BuildSystem::Unknown => Vec::new(),
        }
    }

    /// Read the build descriptor text for `build_system`.
    ///
    /// Bazel projects concatenate the workspace file, the root `BUILD` file
    /// and `.bazelproject`, each under a `=== name ===` header. Unreadable
    /// files degrade to empty text.
    pub fn build_descriptor(&self, build_system: BuildSystem) -> String {
        let files = self.descriptor_files(build_system);
        if build_system != BuildSystem::Bazel {
            return files.first().map(|p| read_or_empty(p)).unwrap_or_default();
        }

        files
            .iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("=== {} ===\n\n{}", name, read_or_empty(path))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full [`ProjectContext`] for a run.
    pub fn inspect(&self, package_name: impl Into<String>) -> ProjectContext {
        let build_system = self.build_system();
        ProjectContext {
            base_path: self.root.clone(),
            build_system,
            build_descriptor: self.build_descriptor(build_system),
            is_multiplatform: self.is_multiplatform(),
            package_name: package_name.into(),
        }
    }
}

fn read_or_empty(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read build descriptor");
            String::new()
        }
    }
}
