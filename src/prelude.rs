//! Convenient re-exports for common usage.
//!
//! This prelude includes the most commonly used types and functions for
//! wrapping and tracing errors.
//!
//! ## Usage
//!
//! ```rust
//! use tracewrap::prelude::*;
//!
//! fn load() -> Result<String, Wrapped> {
//!     std::fs::read_to_string("data.txt").trace_msg("loading data")
//! }
//!
//! fn run() -> Result<String, Wrapped> {
//!     load().trace()
//! }
//! ```

pub use crate::report::print_trace;
pub use crate::{wrap, wrap_msg, ResultWrapExt, Trace, Wrapped};
