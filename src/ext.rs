//! Extension traits for ergonomic error tracing on Results.
//!
//! This module provides [`ResultWrapExt`], which lets fallible code capture a
//! call site at each propagation boundary directly on the `Result`, avoiding
//! verbose `map_err` boilerplate:
//!
//! ```rust
//! use tracewrap::{ResultWrapExt, Wrapped};
//!
//! fn read_config() -> Result<String, Wrapped> {
//!     let raw = std::fs::read_to_string("config.toml").trace_msg("loading config")?;
//!     Ok(raw)
//! }
//! ```

use core::fmt;
use std::error::Error;

use crate::site::Site;
use crate::wrapped::Wrapped;

// ============================================================================
// ResultWrapExt - wrap-and-capture on Result
// ============================================================================

/// Extension trait that wraps a `Result`'s error and captures the call site.
///
/// Implemented for every `Result<T, E>` whose error is a `'static` error
/// type, including `Wrapped` itself, so repeated `.trace()?` along a call
/// path accumulates one site per boundary. An `Ok` passes through untouched,
/// with no site captured and no allocation.
pub trait ResultWrapExt<T>: Sized {
    /// Wrap the error and capture the caller's location.
    fn trace(self) -> Result<T, Wrapped>;

    /// Wrap the error with a context message and capture the caller's
    /// location.
    fn trace_msg(self, message: impl Into<String>) -> Result<T, Wrapped>;

    /// Wrap the error with a lazily built context message.
    ///
    /// The closure runs only on the error path, so formatting cost is not
    /// paid for successful calls:
    ///
    /// ```rust
    /// use tracewrap::{ResultWrapExt, Wrapped};
    ///
    /// fn fetch(user_id: u64) -> Result<(), Wrapped> {
    ///     lookup(user_id).trace_with(|| format!("fetching user {user_id}"))?;
    ///     Ok(())
    /// }
    /// # fn lookup(_id: u64) -> Result<(), std::io::Error> { Ok(()) }
    /// ```
    fn trace_with(self, message: impl FnOnce() -> String) -> Result<T, Wrapped>;
}

impl<T, E> ResultWrapExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    #[track_caller]
    #[inline]
    fn trace(self) -> Result<T, Wrapped> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(Wrapped::wrap_with_site(err, Site::caller(), String::new())),
        }
    }

    #[track_caller]
    #[inline]
    fn trace_msg(self, message: impl Into<String>) -> Result<T, Wrapped> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(Wrapped::wrap_with_site(err, Site::caller(), message.into())),
        }
    }

    #[track_caller]
    #[inline]
    fn trace_with(self, message: impl FnOnce() -> String) -> Result<T, Wrapped> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(Wrapped::wrap_with_site(err, Site::caller(), message())),
        }
    }
}

// ============================================================================
// DisplayWrapExt - wrap-and-capture for non-Error failure values
// ============================================================================

/// Extension for `Result`s whose error type is displayable but not an
/// `Error`, e.g. `String` errors from quick prototypes.
pub trait DisplayWrapExt<T>: Sized {
    /// Convert the error through its string form, wrap it, and capture the
    /// caller's location.
    fn trace_display(self) -> Result<T, Wrapped>;
}

impl<T, E: fmt::Display> DisplayWrapExt<T> for Result<T, E> {
    #[track_caller]
    #[inline]
    fn trace_display(self) -> Result<T, Wrapped> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(Wrapped::wrap_with_site(
                Wrapped::from_display(err),
                Site::caller(),
                String::new(),
            )),
        }
    }
}
