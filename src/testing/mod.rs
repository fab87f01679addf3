//! Testing infrastructure for dessert.
//!
//! This module provides mocks and fixtures for testing capture, placement
//! and the generation pipeline without a live debugger.
//!
//! # Architecture
//!
//! - **Mocks**: Stand-ins for the debugger host contracts (frame, session, project)
//! - **Fixtures**: Temporary JVM project trees (test-only)
//!
//! The mock model client lives next to the real ones in [`crate::llm`].
//!
//! # Example
//!
//! ```rust,ignore
//! use dessert::testing::{MockStackFrame, MockValue, MockSession};
//!
//! let frame = MockStackFrame::new("/p/src/main/kotlin/Cart.kt", 4)
//!     .with_variable("total", MockValue::text("12"));
//! let session = MockSession::paused();
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
