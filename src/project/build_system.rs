//! Build system detection from project root markers.
//!
//! Detection checks marker files in a fixed precedence order and the first
//! match wins: Gradle, Maven, SBT, then Bazel. Bazel needs both a workspace
//! file and a root `BUILD` file. The order is kept exactly as is, so a Gradle
//! wrapper living inside a Bazel repository still detects as Gradle.

use std::fmt;
use std::path::Path;

use tracing::debug;

/// Build systems whose test trees we know how to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BuildSystem {
    Gradle,
    Maven,
    Sbt,
    Bazel,
    Unknown,
}

const GRADLE_MARKERS: &[&str] = &[
    "build.gradle.kts",
    "build.gradle",
    "settings.gradle.kts",
    "settings.gradle",
];
const MAVEN_MARKERS: &[&str] = &["pom.xml"];
const SBT_MARKERS: &[&str] = &["build.sbt"];
const BAZEL_WORKSPACE_MARKERS: &[&str] = &["WORKSPACE", "WORKSPACE.bazel"];
const BAZEL_BUILD_MARKERS: &[&str] = &["BUILD", "BUILD.bazel"];

impl BuildSystem {
    /// Human-readable label used in capture headers.
    pub const fn display_name(&self) -> &'static str {
        match self {
            BuildSystem::Gradle => "Gradle",
            BuildSystem::Maven => "Maven",
            BuildSystem::Sbt => "SBT",
            BuildSystem::Bazel => "Bazel",
            BuildSystem::Unknown => "Unknown",
        }
    }

    /// Detect the build system of the project rooted at `root`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dessert::BuildSystem;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// assert_eq!(BuildSystem::detect(dir.path()), BuildSystem::Unknown);
    ///
    /// std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
    /// assert_eq!(BuildSystem::detect(dir.path()), BuildSystem::Maven);
    /// ```
    pub fn detect(root: &Path) -> Self {
        let detected = if any_exists(root, GRADLE_MARKERS) {
            BuildSystem::Gradle
        } else if any_exists(root, MAVEN_MARKERS) {
            BuildSystem::Maven
        } else if any_exists(root, SBT_MARKERS) {
            BuildSystem::Sbt
        } else if any_exists(root, BAZEL_WORKSPACE_MARKERS)
            && any_exists(root, BAZEL_BUILD_MARKERS)
        {
            BuildSystem::Bazel
        } else {
            BuildSystem::Unknown
        };

        debug!(root = %root.display(), build_system = %detected, "Detected build system");
        detected
    }

    /// Section label for the build descriptor excerpt in a capture block.
    pub const fn descriptor_label(&self) -> &'static str {
        match self {
            BuildSystem::Gradle => "BUILD GRADLE CONTENT",
            BuildSystem::Maven => "POM.XML CONTENT",
            BuildSystem::Sbt => "BUILD.SBT CONTENT",
            BuildSystem::Bazel => "BAZEL BUILD CONTENT",
            BuildSystem::Unknown => "BUILD CONTENT",
        }
    }

    /// One-line testing convention hint embedded in prompts.
    pub const fn testing_hint(&self) -> &'static str {
        match self {
            BuildSystem::Gradle => {
                "This is a Gradle project. Use appropriate Gradle test configurations."
            }
            BuildSystem::Maven => {
                "This is a Maven project. Use appropriate Maven test configurations."
            }
            BuildSystem::Sbt => "This is an SBT project. Use appropriate SBT test configurations.",
            BuildSystem::Bazel => {
                "This is a Bazel project. Use appropriate Bazel test targets and BUILD file configurations."
            }
            BuildSystem::Unknown => "Build system not detected. Use standard testing practices.",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn any_exists(root: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| root.join(name).exists())
}
