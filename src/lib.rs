//! # tracewrap - Error wrapping with call-site provenance
//!
//! Wrap errors as they propagate, capture each call site at zero stack-walk
//! cost, and render the whole chain as a readable trace:
//!
//! ```text
//! commit failed: flush failed: disk full
//!
//! {
//!     "StatusCode": 500
//! }
//!
//! app::store.flush:src/store.rs:142
//!     writer.flush().trace()?;
//! app::store.commit:src/store.rs:89
//!     self.flush().trace_msg("flush failed")?;
//!
//! ```
//!
//! ## Try It Now
//!
//! No setup required: wrap at the failure point and propagate with
//! [`.trace()`](ResultWrapExt::trace):
//!
//! ```rust
//! use tracewrap::{ResultWrapExt, Wrapped};
//!
//! fn read_settings() -> Result<String, Wrapped> {
//!     std::fs::read_to_string("settings.toml").trace_msg("loading settings")
//! }
//!
//! fn startup() -> Result<String, Wrapped> {
//!     let settings = read_settings().trace()?;
//!     Ok(settings)
//! }
//!
//! if let Err(err) = startup() {
//!     // message: "loading settings: <io error>", two captured sites
//!     eprintln!("{err}");
//! }
//! ```
//!
//! ## How sites are captured
//!
//! There is no runtime stack inspection. Every wrapping entry point is
//! `#[track_caller]`, so the compiler hands over the caller's file and line
//! as a `&'static Location`; the [`wrap!`] macro additionally captures the
//! enclosing function's path through a zero-sized closure's type name. One
//! site is recorded per wrap, and a [`Trace`] reconstructs the full path by
//! concatenating each wrap's sites, deepest wrap first.
//!
//! | Entry point | Function name in trace | Use when |
//! |-------------|------------------------|----------|
//! | [`wrap(err)`](wrap()) / [`.trace()`](ResultWrapExt::trace) | no (file:line only) | propagation boundaries |
//! | [`wrap!(err)`](wrap!) | yes | you want `pkg.method` headers in the trace |
//! | [`wrap_structured(err)`](wrap_structured()) | no | the cause should surface as JSON context |
//!
//! ## Inspecting chains
//!
//! Wrapping never hides an error. The walking API ([`chain`], [`cause`],
//! [`is`], [`find_cause`]) operates through the standard `source()` protocol,
//! so `io::Error`, `anyhow` errors and friends participate like native
//! [`Wrapped`] values:
//!
//! ```rust
//! use tracewrap::{find_cause, wrap_msg};
//!
//! let io = std::io::Error::other("device lost");
//! let err = wrap_msg(io, "flush failed");
//! assert!(find_cause::<std::io::Error>(&err).is_some());
//! ```
//!
//! ## Reporting
//!
//! At the top of the program, a [`Reporter`] turns the final
//! `Result<T, Wrapped>` back into a value and renders the trace through a
//! swappable [`Logger`] (stderr by default, or [`TracingLogger`] to route
//! through a `tracing` subscriber):
//!
//! ```rust,no_run
//! use tracewrap::{default_reporter, ResultWrapExt, Wrapped};
//!
//! fn run() -> Result<(), Wrapped> {
//!     std::fs::read_to_string("input.txt").trace_msg("reading input")?;
//!     Ok(())
//! }
//!
//! fn main() {
//!     default_reporter().handle_and_log_trace(run(), |_err| {
//!         std::process::exit(1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod ext;
mod report;
mod site;
mod trace;
mod walk;
mod wrapped;

pub mod prelude;

#[cfg(test)]
mod tests;

pub use ext::{DisplayWrapExt, ResultWrapExt};
pub use report::{default_reporter, print_trace, Logger, Reporter, StderrLogger, TracingLogger};
pub use site::{Site, SiteInfo};
pub use trace::{Frame, Trace};
pub use walk::{
    cause, chain, find_cause, is, is_equivalent, try_unwrap_one, unwrap_one, Chain, Equivalent,
    TraceNotSupported, UnwrapNotSupported,
};
pub use wrapped::{wrap, wrap_msg, wrap_structured, Wrapped};

/// Wrap an error, capturing the call site *and* the enclosing function's path.
///
/// Like [`wrap()`] / [`wrap_msg()`], but the resulting trace frames carry
/// `pkg.method` headers because the macro captures the enclosing function
/// through a zero-sized closure's type name. Extra arguments become the
/// context message, joined with `": "`.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{Trace, Wrapped};
///
/// fn persist() -> Result<(), Wrapped> {
///     let io = std::io::Error::other("device lost");
///     Err(tracewrap::wrap!(io, "persisting state"))
/// }
///
/// let err = persist().unwrap_err();
/// let trace = Trace::new(&err);
/// assert_eq!(trace.stack()[0].method, "persist");
/// ```
#[macro_export]
macro_rules! wrap {
    ($value:expr $(,)?) => {
        $crate::Wrapped::wrap_with_site(
            $value,
            $crate::Site::of(|| {}),
            ::std::string::String::new(),
        )
    };
    ($value:expr, $($message:expr),+ $(,)?) => {
        $crate::Wrapped::wrap_with_site(
            $value,
            $crate::Site::of(|| {}),
            [$($message),+].join(": "),
        )
    };
}
