//! Test fixtures for creating reproducible project trees.
//!
//! Provides pre-built JVM project layouts for consistent testing.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::gradle_project();
/// let source = fixture.write("app/src/main/kotlin/com/x/Cart.kt", "package com.x\n");
/// // Directory is cleaned up when fixture goes out of scope
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create an empty project with no build descriptor.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a single-module Gradle project.
    #[must_use]
    pub fn gradle_project() -> Self {
        let fixture = Self::empty();
        fixture.write("build.gradle.kts", Self::gradle_content());
        fixture
    }

    /// Create a Maven project.
    #[must_use]
    pub fn maven_project() -> Self {
        let fixture = Self::empty();
        fixture.write("pom.xml", Self::pom_content());
        fixture
    }

    /// Create an SBT project.
    #[must_use]
    pub fn sbt_project() -> Self {
        let fixture = Self::empty();
        fixture.write("build.sbt", "scalaVersion := \"3.3.1\"\n");
        fixture
    }

    /// Create a Bazel workspace with a root BUILD file.
    #[must_use]
    pub fn bazel_project() -> Self {
        let fixture = Self::empty();
        fixture.write("WORKSPACE", "workspace(name = \"demo\")\n");
        fixture.write("BUILD", "java_library(name = \"lib\")\n");
        fixture
    }

    /// Create a Kotlin Multiplatform project with a `shared` module.
    #[must_use]
    pub fn kmp_project() -> Self {
        let fixture = Self::empty();
        fixture.write("build.gradle.kts", "plugins {\n    kotlin(\"jvm\") apply false\n}\n");
        fixture.write(
            "shared/build.gradle.kts",
            "plugins {\n    kotlin(\"multiplatform\") version \"1.9.0\"\n}\n",
        );
        fixture
    }

    /// Write `content` at `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Read a file relative to the project root, if present.
    pub fn read(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.temp_dir.path().join(relative)).ok()
    }

    /// Get the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn gradle_content() -> &'static str {
        r#"plugins {
    kotlin("jvm") version "1.9.0"
}

dependencies {
    testImplementation(kotlin("test"))
}
"#
    }

    fn pom_content() -> &'static str {
        r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
</project>
"#
    }
}
