//! Recorded frames for replay outside a debugger.
//!
//! A snapshot is a JSON file holding what a debugger would report for one
//! paused frame:
//!
//! ```json
//! {
//!   "source": "app/src/main/kotlin/com/example/Cart.kt",
//!   "line": 12,
//!   "variables": [
//!     { "name": "items", "value": "[Item(1), Item(2)]" },
//!     { "name": "lazy", "value": null },
//!     { "name": "remote", "error": "VM disconnected" }
//!   ]
//! }
//! ```
//!
//! A `null` value replays as a value with no text, an `error` as a failed
//! computation. Setting `"hang": true` makes the enumeration never finish.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capture::{Child, ChildrenNode, DebugSession, DebugValue, SourcePosition, StackFrame};
use crate::error::{DessertError, Result};

/// One recorded variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVariable {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DebugValue for SnapshotVariable {
    fn compute_value(&self) -> std::result::Result<Option<String>, String> {
        match self.error {
            Some(ref message) => Err(message.clone()),
            None => Ok(self.value.clone()),
        }
    }
}

/// A recorded paused frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Source file, absolute or relative to the project root
    pub source: PathBuf,
    /// Zero-based paused line
    pub line: u32,
    #[serde(default)]
    pub variables: Vec<SnapshotVariable>,
    /// Never report the end of the enumeration
    #[serde(default)]
    pub hang: bool,
}

impl FrameSnapshot {
    /// Load a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DessertError::Filesystem`] if the file cannot be read and
    /// [`DessertError::Json`] if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| DessertError::filesystem(path, e))?;
        let snapshot: Self = serde_json::from_str(&text)?;
        debug!(
            path = %path.display(),
            variables = snapshot.variables.len(),
            "Loaded frame snapshot"
        );
        Ok(snapshot)
    }

    /// Turn the snapshot into a replayable frame, resolving a relative
    /// source path against `root`.
    pub fn into_frame(self, root: &Path) -> SnapshotFrame {
        let source = if self.source.is_absolute() {
            self.source
        } else {
            root.join(self.source)
        };
        SnapshotFrame {
            position: SourcePosition::new(source, self.line),
            variables: self.variables,
            hang: self.hang,
        }
    }
}

/// A [`StackFrame`] that replays a [`FrameSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotFrame {
    position: SourcePosition,
    variables: Vec<SnapshotVariable>,
    hang: bool,
}

impl StackFrame for SnapshotFrame {
    fn source_position(&self) -> Option<SourcePosition> {
        Some(self.position.clone())
    }

    fn compute_children(&self, node: ChildrenNode) {
        let children = self
            .variables
            .iter()
            .map(|v| Child::new(v.name.clone(), v.clone()))
            .collect();
        node.add_children(children, !self.hang);
    }
}

/// A session that is always paused, since a snapshot is a paused frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaySession;

impl DebugSession for ReplaySession {
    fn is_paused(&self) -> bool {
        true
    }
}
