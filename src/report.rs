//! Error reporting at recovery boundaries.
//!
//! A [`Reporter`] is the top-level recovery point for a `Result<T, Wrapped>`
//! pipeline: it pattern-matches the final result, renders traces, and writes
//! them through a swappable [`Logger`]. A process-wide stderr-backed instance
//! is available through [`default_reporter`]; tests and embedders construct
//! their own with a custom logger.

use core::fmt;
use std::error::Error;
use std::sync::OnceLock;

use crate::trace::Trace;
use crate::wrapped::Wrapped;

// ============================================================================
// Logger - output seam
// ============================================================================

/// Destination for rendered error output.
///
/// Implementations receive pre-formatted arguments and write them somewhere;
/// callers include their own trailing newlines, so a logger performs a raw
/// write.
pub trait Logger: Send + Sync {
    /// Write the formatted arguments.
    fn log(&self, args: fmt::Arguments<'_>);
}

/// The default logger: writes to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        eprint!("{args}");
    }
}

/// Logger adapter emitting through the `tracing` facade at error level.
///
/// Useful when the surrounding application already routes diagnostics through
/// a `tracing` subscriber:
///
/// ```rust
/// use tracewrap::{Reporter, TracingLogger};
///
/// let reporter = Reporter::new(TracingLogger);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        tracing::error!("{args}");
    }
}

// ============================================================================
// Reporter - recovery point
// ============================================================================

/// Top-level recovery point for wrapped-error pipelines.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{Reporter, ResultWrapExt, Wrapped};
///
/// fn run() -> Result<u32, Wrapped> {
///     "42".parse::<u32>().trace_msg("parsing answer")
/// }
///
/// let reporter = Reporter::default();
/// let value = reporter.handle_and_log(run(), |_err| {
///     // cleanup on failure
/// });
/// assert_eq!(value, Some(42));
/// ```
pub struct Reporter {
    logger: Box<dyn Logger>,
}

impl Default for Reporter {
    /// A reporter writing to standard error.
    fn default() -> Self {
        Self::new(StderrLogger)
    }
}

impl Reporter {
    /// Build a reporter over the given logger.
    pub fn new(logger: impl Logger + 'static) -> Self {
        Self {
            logger: Box::new(logger),
        }
    }

    /// Render `err`'s full trace and write it through the logger.
    ///
    /// Best-effort: an error without capture information still prints its
    /// message, just with no frame list.
    pub fn print_trace(&self, err: &(dyn Error + 'static)) {
        let trace = Trace::new(err);
        self.logger.log(format_args!("{}", trace.render_text()));
    }

    /// Recover from a finished pipeline: unwrap `Ok`, or run `on_error` and
    /// yield `None`.
    ///
    /// The callback owns the error, so it can rethrow (return it from the
    /// enclosing function), log it, or drop it.
    pub fn handle<T>(
        &self,
        result: Result<T, Wrapped>,
        on_error: impl FnOnce(Wrapped),
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                on_error(err);
                None
            }
        }
    }

    /// Like [`handle`](Self::handle), but logs the error's message first.
    pub fn handle_and_log<T>(
        &self,
        result: Result<T, Wrapped>,
        on_error: impl FnOnce(Wrapped),
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.logger.log(format_args!("{err}\n"));
                on_error(err);
                None
            }
        }
    }

    /// Like [`handle`](Self::handle), but logs the error's message and its
    /// full rendered trace first.
    ///
    /// A chain without capture information logs the trace-unavailable notice
    /// instead of a frame list.
    pub fn handle_and_log_trace<T>(
        &self,
        result: Result<T, Wrapped>,
        on_error: impl FnOnce(Wrapped),
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.logger.log(format_args!("{err}\n"));
                match Trace::try_new(&err) {
                    Ok(trace) => self.logger.log(format_args!("{}", trace.render_text())),
                    Err(unsupported) => self.logger.log(format_args!("{unsupported}\n")),
                }
                on_error(err);
                None
            }
        }
    }
}

// ============================================================================
// Process-wide default
// ============================================================================

/// The process-wide reporter, stderr-backed, initialized on first use.
pub fn default_reporter() -> &'static Reporter {
    static DEFAULT: OnceLock<Reporter> = OnceLock::new();
    DEFAULT.get_or_init(Reporter::default)
}

/// Render `err`'s full trace to standard error via the default reporter.
pub fn print_trace(err: &(dyn Error + 'static)) {
    default_reporter().print_trace(err);
}
