//! Collaborator contracts supplied by the debugger host.
//!
//! The host hands us a paused [`StackFrame`], its [`DebugSession`] and the
//! [`HostProject`]. Child enumeration is callback driven: the frame receives
//! a [`ChildrenNode`] and reports batches, errors or completion on it from
//! whatever thread the debugger uses. Every callback reduces to one of
//! continue, terminate-success or terminate-error.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

use super::extractor::{render_value, COULD_NOT_EXTRACT};

/// Source location of a paused frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// Absolute path of the source file
    pub path: PathBuf,
    /// Zero-based line number, as debuggers report it
    pub line: u32,
}

impl SourcePosition {
    pub fn new(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// File name component, `"Unknown"` when the path has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// A value shown in the debugger's variables view.
pub trait DebugValue: Send {
    /// Compute the value's textual form.
    ///
    /// `Ok(None)` means this kind of value has no computable text (rendered
    /// as `<could not extract>`); `Err` is a failed computation (rendered as
    /// `<extraction error>`).
    fn compute_value(&self) -> std::result::Result<Option<String>, String>;
}

/// A single paused stack level.
pub trait StackFrame: Send + Sync {
    /// Where execution is paused, if the debugger knows.
    fn source_position(&self) -> Option<SourcePosition>;

    /// Start enumerating the frame's locals, reporting on `node`.
    ///
    /// Implementations may return immediately and report later from another
    /// thread, or report inline. They may also never report completion.
    fn compute_children(&self, node: ChildrenNode);
}

/// The debug session owning the frame.
pub trait DebugSession: Send + Sync {
    fn is_paused(&self) -> bool;
}

/// The project open in the host.
pub trait HostProject: Send + Sync {
    fn base_path(&self) -> Option<PathBuf>;
}

/// A named child as delivered by the debugger.
pub struct Child {
    pub name: String,
    pub value: Box<dyn DebugValue>,
}

impl Child {
    pub fn new(name: impl Into<String>, value: impl DebugValue + 'static) -> Self {
        Self {
            name: name.into(),
            value: Box::new(value),
        }
    }
}

/// Names of the implicit receiver, never reported as a local.
pub const RECEIVER_NAMES: &[&str] = &["this", "self"];

/// How an enumeration ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationEnd {
    /// The last batch arrived or the variable cap was reached
    Completed,
    /// The debugger reported more children than it would send
    TooManyChildren { remaining: usize },
    /// The debugger reported an error message
    Failed(String),
}

#[derive(Debug)]
pub(crate) struct Collector {
    // A `None` value is a reserved slot whose rendering has not finished
    variables: Mutex<Vec<(String, Option<String>)>>,
    end: Mutex<Option<EnumerationEnd>>,
    finished: AtomicBool,
    done: Notify,
    max_variables: usize,
    max_value_chars: usize,
}

impl Collector {
    pub(crate) fn new(max_variables: usize, max_value_chars: usize) -> Arc<Self> {
        Arc::new(Self {
            variables: Mutex::new(Vec::new()),
            end: Mutex::new(None),
            finished: AtomicBool::new(false),
            done: Notify::new(),
            max_variables,
            max_value_chars,
        })
    }

    pub(crate) fn snapshot(&self) -> Vec<(String, String)> {
        self.variables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, value)| {
                let value = value.clone().unwrap_or_else(|| COULD_NOT_EXTRACT.to_string());
                (name.clone(), value)
            })
            .collect()
    }

    /// Claim the next slot for `name`, or `None` once the cap is reached.
    fn reserve(&self, name: &str) -> Option<usize> {
        let mut variables = self.variables.lock().unwrap_or_else(PoisonError::into_inner);
        if variables.len() >= self.max_variables {
            return None;
        }
        variables.push((name.to_string(), None));
        Some(variables.len() - 1)
    }

    fn fill(&self, slot: usize, value: String) {
        let mut variables = self.variables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = variables.get_mut(slot) {
            entry.1 = Some(value);
        }
    }

    fn len(&self) -> usize {
        self.variables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn end(&self) -> Option<EnumerationEnd> {
        self.end
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) async fn wait(&self) {
        self.done.notified().await;
    }

    fn finish(&self, end: EnumerationEnd) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.end.lock().unwrap_or_else(PoisonError::into_inner) = Some(end);
        // notify_one stores a permit, so a waiter arriving later still wakes
        self.done.notify_one();
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Callback handle passed to [`StackFrame::compute_children`].
///
/// Cheap to clone and safe to use from any thread. Calls after the
/// enumeration has ended are ignored.
#[derive(Debug, Clone)]
pub struct ChildrenNode {
    collector: Arc<Collector>,
}

impl ChildrenNode {
    pub(crate) fn new(collector: Arc<Collector>) -> Self {
        Self { collector }
    }

    /// Deliver a batch of children; `last` ends the enumeration.
    ///
    /// Values are rendered here, on the caller's thread. The receiver is
    /// skipped and nothing past the variable cap is rendered. A slot is
    /// claimed before rendering, so concurrent batches never exceed the cap.
    pub fn add_children(&self, children: Vec<Child>, last: bool) {
        if self.collector.is_finished() {
            return;
        }

        for child in children {
            if RECEIVER_NAMES.contains(&child.name.as_str()) {
                continue;
            }
            let Some(slot) = self.collector.reserve(&child.name) else {
                debug!("Variable cap of {} reached", self.collector.max_variables);
                self.collector.finish(EnumerationEnd::Completed);
                return;
            };
            let rendered =
                render_value(child.value.as_ref(), &child.name, self.collector.max_value_chars);
            self.collector.fill(slot, rendered);
        }

        if last || self.collector.len() >= self.collector.max_variables {
            self.collector.finish(EnumerationEnd::Completed);
        }
    }

    /// The debugger will not send the remaining children.
    pub fn too_many_children(&self, remaining: usize) {
        self.collector
            .finish(EnumerationEnd::TooManyChildren { remaining });
    }

    /// The enumeration failed.
    pub fn set_error_message(&self, message: &str) {
        self.collector
            .finish(EnumerationEnd::Failed(message.to_string()));
    }

    /// Ordering hint from the debugger; extraction order is kept as is.
    pub fn set_already_sorted(&self, _already_sorted: bool) {}
}

impl<P: AsRef<Path> + Send + Sync> HostProject for Option<P> {
    fn base_path(&self) -> Option<PathBuf> {
        self.as_ref().map(|p| p.as_ref().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Text(&'static str);

    impl DebugValue for Text {
        fn compute_value(&self) -> std::result::Result<Option<String>, String> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[test]
    fn test_source_position_file_name() {
        let pos = SourcePosition::new("/proj/src/main/kotlin/Foo.kt", 12);
        assert_eq!(pos.file_name(), "Foo.kt");
        assert_eq!(SourcePosition::new("/", 0).file_name(), "Unknown");
    }

    #[test]
    fn test_node_skips_receiver() {
        let collector = Collector::new(20, 200);
        let node = ChildrenNode::new(collector.clone());
        node.add_children(
            vec![Child::new("this", Text("Foo@1")), Child::new("x", Text("1"))],
            true,
        );
        assert_eq!(collector.snapshot(), vec![("x".to_string(), "\"1\"".to_string())]);
        assert_eq!(collector.end(), Some(EnumerationEnd::Completed));
    }

    #[test]
    fn test_node_caps_and_completes() {
        let collector = Collector::new(2, 200);
        let node = ChildrenNode::new(collector.clone());
        node.add_children(
            vec![
                Child::new("a", Text("1")),
                Child::new("b", Text("2")),
                Child::new("c", Text("3")),
            ],
            false,
        );
        assert_eq!(collector.snapshot().len(), 2);
        assert_eq!(collector.end(), Some(EnumerationEnd::Completed));
    }

    struct Slow(&'static str);

    impl DebugValue for Slow {
        fn compute_value(&self) -> std::result::Result<Option<String>, String> {
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Some(self.0.to_string()))
        }
    }

    #[test]
    fn test_concurrent_batches_respect_cap() {
        let collector = Collector::new(20, 200);
        let handles: Vec<_> = (0..3)
            .map(|t| {
                let node = ChildrenNode::new(collector.clone());
                std::thread::spawn(move || {
                    let children = (0..15)
                        .map(|i| Child::new(format!("t{}_{}", t, i), Slow("v")))
                        .collect();
                    node.add_children(children, false);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let variables = collector.snapshot();
        assert_eq!(variables.len(), 20);
        assert!(variables.iter().all(|(_, value)| value == "\"v\""));
        assert_eq!(collector.end(), Some(EnumerationEnd::Completed));
    }

    #[test]
    fn test_unfinished_slot_reads_as_placeholder() {
        let collector = Collector::new(20, 200);
        let slot = collector.reserve("pending").unwrap();
        assert_eq!(
            collector.snapshot(),
            vec![("pending".to_string(), COULD_NOT_EXTRACT.to_string())]
        );
        collector.fill(slot, "\"1\"".to_string());
        assert_eq!(collector.snapshot()[0].1, "\"1\"");
    }

    #[test]
    fn test_calls_after_end_are_ignored() {
        let collector = Collector::new(20, 200);
        let node = ChildrenNode::new(collector.clone());
        node.set_error_message("frame is gone");
        node.add_children(vec![Child::new("late", Text("1"))], true);
        assert!(collector.snapshot().is_empty());
        assert_eq!(
            collector.end(),
            Some(EnumerationEnd::Failed("frame is gone".into()))
        );
    }

    #[test]
    fn test_optional_path_as_host_project() {
        let some: Option<&str> = Some("/proj");
        assert_eq!(some.base_path(), Some(PathBuf::from("/proj")));
        let none: Option<&str> = None;
        assert_eq!(none.base_path(), None);
    }
}
