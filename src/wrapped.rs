//! The `Wrapped` error value.
//!
//! This module provides the core [`Wrapped`] type: an error carrying an
//! optional context message, an owned inner cause, and the call sites
//! captured while the error propagated upward. It's the primary API surface
//! for tracewrap.

use core::fmt;
use std::error::Error;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::site::{Site, SiteInfo};

// ============================================================================
// SiteVec - configurable storage for captured sites
// ============================================================================
//
// Most wraps record exactly one site, so the smallvec feature keeps the
// common case inline and spills to heap only for hand-assembled site lists.

/// Inline site storage with 4 slots (smallvec-sites feature).
#[cfg(feature = "smallvec-sites")]
type SiteVec = smallvec::SmallVec<[Site; 4]>;

/// Heap-allocated site storage (default).
#[cfg(not(feature = "smallvec-sites"))]
type SiteVec = Vec<Site>;

#[inline]
fn one_site(site: Site) -> SiteVec {
    let mut sites = SiteVec::new();
    sites.push(site);
    sites
}

// ============================================================================
// Wrapped - the error value
// ============================================================================

/// An error carrying a context message, an owned cause, and captured call sites.
///
/// `Wrapped` is immutable once constructed. Its `Display` rendering is
/// `message: cause` when a message was attached, and just the cause's
/// rendering otherwise, so nested wraps read like a sentence:
///
/// ```rust
/// use tracewrap::{wrap_msg, Wrapped};
///
/// let base = Wrapped::from_display("disk full");
/// let err = wrap_msg(wrap_msg(base, "flush failed"), "commit failed");
/// assert_eq!(err.to_string(), "commit failed: flush failed: disk full");
/// ```
///
/// ## Site accounting
///
/// Each wrap captures exactly one call site. The deepest `Wrapped` in a chain
/// (the one nearest the original failure) is the canonical holder of the
/// first capture; every shallower wrap stores only the site it newly added.
/// The full trace is reconstructed by walking the chain and concatenating,
/// deepest wrap first; see [`Trace`](crate::Trace).
///
/// ## Example
///
/// ```rust
/// use tracewrap::{wrap, unwrap_one, Wrapped};
///
/// #[derive(Debug)]
/// struct DiskFull;
///
/// impl std::fmt::Display for DiskFull {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "disk full")
///     }
/// }
///
/// impl std::error::Error for DiskFull {}
///
/// let err = wrap(DiskFull);
/// // The wrap nested the plain error inside a site-holding Wrapped.
/// let holder = unwrap_one(&err).unwrap();
/// let holder = holder.downcast_ref::<Wrapped>().unwrap();
/// assert_eq!(holder.sites().len(), 1);
/// assert!(holder.inner().is::<DiskFull>());
/// ```
pub struct Wrapped {
    message: String,
    /// Structural form of the cause, captured at construction when the
    /// concrete type was still known to be serializable.
    context: Option<Map<String, Value>>,
    sites: SiteVec,
    cause: Box<dyn Error + Send + Sync + 'static>,
}

impl Wrapped {
    /// Wrap an error value as-is, with no message and no captured site.
    ///
    /// Use [`wrap()`] or the [`wrap!`](crate::wrap!) macro to capture the
    /// call site; use [`from_display`](Self::from_display) for values that
    /// are not errors.
    pub fn new<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            message: String::new(),
            context: None,
            sites: SiteVec::new(),
            cause: Box::new(err),
        }
    }

    /// Build a `Wrapped` from any displayable value.
    ///
    /// The value's default string form becomes a generic cause:
    ///
    /// ```rust
    /// use tracewrap::Wrapped;
    ///
    /// assert_eq!(Wrapped::from_display(123).to_string(), "123");
    /// ```
    pub fn from_display(value: impl fmt::Display) -> Self {
        Self::new(DisplayError(value.to_string()))
    }

    /// Wrap a serializable error, capturing its structural context.
    ///
    /// The error is serialized once, here, while its concrete type is known.
    /// The result is kept only when it forms a non-empty JSON object; scalars,
    /// empty structs, and serialization failures all degrade to "no context".
    /// The recorded map later surfaces as `error-ctx` in a rendered
    /// [`Trace`](crate::Trace).
    pub fn structured<E>(err: E) -> Self
    where
        E: Error + Serialize + Send + Sync + 'static,
    {
        let context = structural_value(&err);
        Self {
            message: String::new(),
            context,
            sites: SiteVec::new(),
            cause: Box::new(err),
        }
    }

    /// Wrap `value` recording `site`, the central wrap primitive.
    ///
    /// This is what [`wrap()`], [`wrap_msg()`] and the [`wrap!`](crate::wrap!)
    /// macro call after capturing their own call site. The rule:
    ///
    /// - a value whose chain already records sites gains one outer `Wrapped`
    ///   holding the newly added site;
    /// - anything else is first nested inside a fresh site-holding `Wrapped`,
    ///   and the outer wrap keeps an empty site list, since the holder already
    ///   recorded this call, so the outer's delta excludes it.
    ///
    /// Either way, repeated wraps accumulate messages and sites without
    /// losing earlier ones.
    pub fn wrap_with_site<E>(value: E, site: Site, message: String) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::assemble(Box::new(value), site, message, None)
    }

    fn assemble(
        value: Box<dyn Error + Send + Sync + 'static>,
        site: Site,
        message: String,
        context: Option<Map<String, Value>>,
    ) -> Self {
        match value.downcast::<Wrapped>() {
            Ok(inner) if inner.chain_has_sites() => Self {
                message,
                context: None,
                sites: one_site(site),
                cause: inner,
            },
            Ok(inner) => {
                let holder = Self {
                    message: String::new(),
                    context,
                    sites: one_site(site),
                    cause: inner,
                };
                Self {
                    message,
                    context: None,
                    sites: SiteVec::new(),
                    cause: Box::new(holder),
                }
            }
            Err(other) => {
                let holder = Self {
                    message: String::new(),
                    context,
                    sites: one_site(site),
                    cause: other,
                };
                Self {
                    message,
                    context: None,
                    sites: SiteVec::new(),
                    cause: Box::new(holder),
                }
            }
        }
    }

    /// The context message attached at this wrap, if any.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        if self.message.is_empty() {
            None
        } else {
            Some(&self.message)
        }
    }

    /// The structural context captured at construction, if any.
    #[inline]
    pub fn context(&self) -> Option<&Map<String, Value>> {
        self.context.as_ref()
    }

    /// The call sites recorded at this wrap (this wrap's delta only).
    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Whether this wrap itself recorded any sites.
    #[inline]
    pub fn has_sites(&self) -> bool {
        !self.sites.is_empty()
    }

    /// Whether any `Wrapped` in this error's chain recorded sites.
    pub(crate) fn chain_has_sites(&self) -> bool {
        if self.has_sites() {
            return true;
        }
        let mut cur: &(dyn Error + 'static) = &*self.cause;
        while let Some(w) = cur.downcast_ref::<Wrapped>() {
            if w.has_sites() {
                return true;
            }
            match w.source() {
                Some(next) => cur = next,
                None => break,
            }
        }
        false
    }

    /// Resolve every recorded site into its symbolic descriptor, in capture
    /// order (deepest frame first).
    pub fn sites_resolved(&self) -> Vec<SiteInfo> {
        self.sites.iter().map(Site::resolve).collect()
    }

    /// The immediate cause nested inside this wrap.
    #[inline]
    pub fn inner(&self) -> &(dyn Error + 'static) {
        let cause: &(dyn Error + 'static) = &*self.cause;
        cause
    }
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.cause)
        } else {
            write!(f, "{}: {}", self.message, self.cause)
        }
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("message", &self.message)
            .field("sites", &self.sites)
            .field("cause", &self.cause)
            .finish()
    }
}

impl Error for Wrapped {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

// ============================================================================
// DisplayError - generic cause for non-error values
// ============================================================================

/// Generic cause built from a value's default string form.
#[derive(Debug)]
struct DisplayError(String);

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for DisplayError {}

// ============================================================================
// Free wrap functions
// ============================================================================

/// Wrap an error and capture the caller's location.
///
/// The call site lands on the deepest `Wrapped` of the resulting chain; see
/// [`Wrapped::wrap_with_site`] for the exact accounting. For symbol-resolved
/// traces (function names, not just file:line), use the
/// [`wrap!`](crate::wrap!) macro instead.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{wrap, Wrapped};
///
/// fn load() -> Result<(), Wrapped> {
///     let io = std::io::Error::other("device lost");
///     Err(wrap(io))
/// }
/// ```
#[track_caller]
#[inline]
pub fn wrap<E>(value: E) -> Wrapped
where
    E: Error + Send + Sync + 'static,
{
    Wrapped::wrap_with_site(value, Site::caller(), String::new())
}

/// Wrap an error with a context message and capture the caller's location.
///
/// Messages accumulate across wraps, outermost first, colon-separated:
/// `wrap_msg(wrap_msg(e, "a"), "b")` renders as `b: a: <e>`.
#[track_caller]
#[inline]
pub fn wrap_msg<E>(value: E, message: impl Into<String>) -> Wrapped
where
    E: Error + Send + Sync + 'static,
{
    Wrapped::wrap_with_site(value, Site::caller(), message.into())
}

/// Wrap a serializable error, capturing both the caller's location and the
/// error's structural context.
///
/// ## Example
///
/// ```rust
/// use serde::Serialize;
/// use tracewrap::{wrap_structured, Trace};
///
/// #[derive(Debug, Serialize)]
/// struct HttpError {
///     #[serde(rename = "StatusCode")]
///     status_code: u16,
/// }
///
/// impl std::fmt::Display for HttpError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "http request failed")
///     }
/// }
///
/// impl std::error::Error for HttpError {}
///
/// let err = wrap_structured(HttpError { status_code: 500 });
/// let trace = Trace::new(&err);
/// assert_eq!(trace.context().unwrap()["StatusCode"], 500);
/// ```
#[track_caller]
#[inline]
pub fn wrap_structured<E>(value: E) -> Wrapped
where
    E: Error + Serialize + Send + Sync + 'static,
{
    let context = structural_value(&value);
    Wrapped::assemble(Box::new(value), Site::caller(), String::new(), context)
}

/// Serialize a value into a structured map, or nothing.
///
/// Scalars, empty objects, and serialization failures all yield `None`;
/// absence of context is not an error condition.
fn structural_value<T: Serialize>(value: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}
