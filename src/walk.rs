//! Chain walking and cause inspection.
//!
//! Everything here operates on `&(dyn Error + 'static)` through the standard
//! `source()` protocol, so foreign errors participate in walks exactly like
//! [`Wrapped`] values do.

use std::error::Error;

use crate::wrapped::Wrapped;

// ============================================================================
// Chain - iterator over the cause chain
// ============================================================================

/// Iterator over an error and its transitive causes, outermost first.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{chain, wrap_msg, Wrapped};
///
/// let err = wrap_msg(Wrapped::from_display("disk full"), "flush failed");
/// let rendered: Vec<String> = chain(&err).map(|e| e.to_string()).collect();
/// assert_eq!(rendered.last().unwrap(), "disk full");
/// ```
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Iterate over `err` and every transitive cause, outermost first.
#[inline]
pub fn chain<'a>(err: &'a (dyn Error + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

// ============================================================================
// Unwrapping
// ============================================================================

/// Peel exactly one layer off the chain, or `None` for chain-terminal errors.
///
/// This is `source()` under a name that matches the rest of the walking API.
#[inline]
pub fn unwrap_one<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    err.source()
}

/// Peel exactly one layer, reporting chain-terminal errors as a typed failure.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{try_unwrap_one, Wrapped};
///
/// let terminal = std::io::Error::other("device lost");
/// let err = try_unwrap_one(&terminal).unwrap_err();
/// assert!(err.to_string().contains("device lost"));
/// ```
pub fn try_unwrap_one<'a>(
    err: &'a (dyn Error + 'static),
) -> Result<&'a (dyn Error + 'static), UnwrapNotSupported> {
    err.source().ok_or_else(|| UnwrapNotSupported {
        original: err.to_string(),
    })
}

/// Find the root cause of an error.
///
/// When the chain contains site-recording [`Wrapped`] values, the root is the
/// deepest such value in the contiguous wrapped run: the error closest to the
/// original failure that still knows where it was captured. Without any
/// capture information the walk degrades to repeated unwrapping and returns
/// the last element of the chain.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{cause, wrap_msg, Wrapped};
///
/// let err = wrap_msg(wrap_msg(Wrapped::from_display("disk full"), "a"), "b");
/// // The root cause still renders the original failure, without the
/// // messages added on the way up.
/// assert_eq!(cause(&err).to_string(), "disk full");
/// ```
pub fn cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut first = None;
    for e in chain(err) {
        if let Some(w) = e.downcast_ref::<Wrapped>() {
            first = Some(w);
            break;
        }
    }

    if let Some(start) = first {
        let mut current = start;
        let mut deepest_sited = current.has_sites().then_some(current);
        while let Some(next) = current
            .source()
            .and_then(|s| s.downcast_ref::<Wrapped>())
        {
            current = next;
            if current.has_sites() {
                deepest_sited = Some(current);
            }
        }
        if let Some(root) = deepest_sited {
            return root;
        }
    }

    let mut last = err;
    while let Some(next) = last.source() {
        last = next;
    }
    last
}

// ============================================================================
// Matching
// ============================================================================

/// Whether any element of the chain is a `T` equal to `target`.
///
/// Matching is by concrete type (downcast) plus `PartialEq`; wrapping never
/// hides an error from this check.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{is, wrap_msg};
///
/// #[derive(Debug, PartialEq, Clone)]
/// struct Code(u32);
///
/// impl std::fmt::Display for Code {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "code {}", self.0)
///     }
/// }
///
/// impl std::error::Error for Code {}
///
/// let err = wrap_msg(Code(7), "lookup failed");
/// assert!(is(&err, &Code(7)));
/// assert!(!is(&err, &Code(8)));
/// ```
pub fn is<T>(err: &(dyn Error + 'static), target: &T) -> bool
where
    T: Error + PartialEq + 'static,
{
    chain(err).any(|e| e.downcast_ref::<T>().is_some_and(|candidate| candidate == target))
}

/// Custom equivalence for error matching.
///
/// Types whose notion of "the same error" is looser than value equality (for
/// example, matching any error of a given class regardless of payload)
/// implement this and are queried through [`is_equivalent`]. The capability is
/// explicit: only types implementing the trait participate.
pub trait Equivalent: Error {
    /// Whether `target` should be considered equivalent to `self`.
    fn equivalent(&self, target: &(dyn Error + 'static)) -> bool;
}

/// Whether any `T` in the chain reports itself equivalent to `target`.
pub fn is_equivalent<T>(err: &(dyn Error + 'static), target: &(dyn Error + 'static)) -> bool
where
    T: Equivalent + 'static,
{
    chain(err).any(|e| {
        e.downcast_ref::<T>()
            .is_some_and(|candidate| candidate.equivalent(target))
    })
}

/// The first element of the chain with concrete type `T`, if any.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{find_cause, wrap_msg};
///
/// let io = std::io::Error::other("device lost");
/// let err = wrap_msg(io, "flush failed");
/// let found: &std::io::Error = find_cause(&err).unwrap();
/// assert_eq!(found.to_string(), "device lost");
/// ```
pub fn find_cause<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    chain(err).find_map(|e| e.downcast_ref::<T>())
}

// ============================================================================
// Taxonomy
// ============================================================================

/// The queried error exposes no cause to unwrap.
#[derive(Debug, thiserror::Error)]
#[error("unwrapping is not supported by this error: {original}")]
pub struct UnwrapNotSupported {
    /// Rendered form of the error that could not be unwrapped.
    pub original: String,
}

/// The queried error chain records no call sites anywhere.
#[derive(Debug, thiserror::Error)]
#[error("extracting a stack trace is not supported by this error: {original}")]
pub struct TraceNotSupported {
    /// Rendered form of the error that carried no trace.
    pub original: String,
}
