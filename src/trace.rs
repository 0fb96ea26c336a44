//! Trace assembly and rendering.
//!
//! This module turns an error chain into a [`Trace`]: a read-only snapshot of
//! the chain's message, structural context, and resolved call sites. A `Trace`
//! renders to the canonical text layout or serializes to JSON; both forms are
//! stable and suitable for logs.

use core::fmt::{self, Write as _};
use std::error::Error;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::site::Site;
use crate::walk::{cause, chain, TraceNotSupported};
use crate::wrapped::Wrapped;

// ============================================================================
// Frame - one resolved call site
// ============================================================================

/// One resolved call site inside a [`Trace`].
///
/// The symbolic fields may be empty when the site was captured without a
/// function name. `src` holds the whitespace-trimmed source line when the
/// file was readable at assembly time; a `"???"` placeholder stands in for
/// lines the file no longer contains.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Frame {
    /// Namespace enclosing the function, empty if unknown.
    pub package: String,
    /// Bare function name, empty if unknown.
    pub method: String,
    /// Source file path as embedded by the compiler.
    pub file: String,
    /// 1-based line number.
    pub lineno: u32,
    /// The literal source line, absent when the file could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Frame {
    /// Resolve a captured site into a frame, reading its source line.
    ///
    /// The read happens once, here; re-rendering the trace later does not
    /// touch the filesystem again. An unreadable file leaves `src` empty.
    fn from_site(site: Site) -> Self {
        let info = site.resolve();
        let src = info.source_line().ok();
        Self {
            package: info.package,
            method: info.method,
            file: info.file,
            lineno: info.lineno,
            src,
        }
    }
}

impl fmt::Display for Frame {
    /// Formats as a two-line block: the `pkg.method:file:lineno` header
    /// (degrading as symbolic parts are unknown) and, when available, the
    /// tab-indented source line. Each line ends with a newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.package.is_empty(), self.method.is_empty()) {
            (false, false) => writeln!(
                f,
                "{}.{}:{}:{}",
                self.package, self.method, self.file, self.lineno
            )?,
            (true, false) => writeln!(f, "{}:{}:{}", self.method, self.file, self.lineno)?,
            _ => writeln!(f, "{}:{}", self.file, self.lineno)?,
        }
        if let Some(src) = &self.src {
            writeln!(f, "\t{src}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Trace - assembled snapshot of an error chain
// ============================================================================

/// A read-only snapshot of an error chain: message, structural context, and
/// the resolved call sites in capture order (deepest frame first).
///
/// Assembly is best-effort by design: a chain without any capture information
/// yields an empty stack, unreadable source files yield frames without `src`,
/// and a missing context simply leaves `error-ctx` out of the serialized
/// form. Use [`try_new`](Self::try_new) when an empty stack should be an
/// error instead.
///
/// ## Example
///
/// ```rust
/// use tracewrap::{wrap_msg, Trace, Wrapped};
///
/// let err = wrap_msg(Wrapped::from_display("disk full"), "flush failed");
/// let trace = Trace::new(&err);
/// assert_eq!(trace.message(), "flush failed: disk full");
/// assert!(!trace.stack().is_empty());
/// ```
pub struct Trace {
    message: String,
    context: Option<Map<String, Value>>,
    stack: Vec<Frame>,
}

impl Trace {
    /// Assemble a trace from an error chain, best-effort.
    ///
    /// The message is the outermost error's rendering (accumulated wrap
    /// messages included). The stack concatenates every wrap's recorded
    /// sites, deepest wrap first, so the first frame is the capture nearest
    /// the original failure. The context is the first structural map recorded
    /// in the chain, if any.
    pub fn new(err: &(dyn Error + 'static)) -> Self {
        let message = err.to_string();
        let context = cause(err)
            .downcast_ref::<Wrapped>()
            .and_then(recorded_context);
        let stack = chain_sites(err).into_iter().map(Frame::from_site).collect();
        Self {
            message,
            context,
            stack,
        }
    }

    /// Assemble a trace, failing when the chain records no call sites.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use tracewrap::Trace;
    ///
    /// let plain = std::io::Error::other("device lost");
    /// assert!(Trace::try_new(&plain).is_err());
    /// ```
    pub fn try_new(err: &(dyn Error + 'static)) -> Result<Self, TraceNotSupported> {
        let trace = Self::new(err);
        if trace.stack.is_empty() {
            Err(TraceNotSupported {
                original: err.to_string(),
            })
        } else {
            Ok(trace)
        }
    }

    /// The outermost error's rendered message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structural context recorded nearest the root cause, if any.
    #[inline]
    pub fn context(&self) -> Option<&Map<String, Value>> {
        self.context.as_ref()
    }

    /// The resolved frames, deepest capture first.
    #[inline]
    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    /// Render the canonical text layout.
    ///
    /// ```text
    /// flush failed: disk full
    ///
    /// {
    ///     "StatusCode": 500
    /// }
    ///
    /// app.flush:src/store.rs:42
    ///     writer.flush().trace()?;
    ///
    /// ```
    ///
    /// The message always leads, followed by a blank line. The context block
    /// (key-sorted, 4-space-indented JSON) and the frame list each appear
    /// only when present, each followed by a blank line. A context that fails
    /// to serialize is skipped, never an error.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.message);
        out.push_str("\n\n");

        if let Some(context) = &self.context {
            if let Ok(pretty) = pretty_json(context) {
                out.push_str(&pretty);
                out.push_str("\n\n");
            }
        }

        if !self.stack.is_empty() {
            for frame in &self.stack {
                let _ = write!(out, "{frame}");
            }
            out.push('\n');
        }

        out
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("message", &self.message)
            .field("context", &self.context)
            .field("stack", &self.stack)
            .finish()
    }
}

impl Serialize for Trace {
    /// Serializes as a map: `error-msg` always, `error-ctx` only when context
    /// was recorded, `stack` only when non-empty.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("error-msg", &self.message)?;
        if let Some(context) = &self.context {
            map.serialize_entry("error-ctx", context)?;
        }
        if !self.stack.is_empty() {
            map.serialize_entry("stack", &self.stack)?;
        }
        map.end()
    }
}

// ============================================================================
// Assembly helpers
// ============================================================================

/// Collect every site recorded along the chain, deepest wrap first.
///
/// Walks outermost to inner: finds the first `Wrapped`, gathers each
/// consecutive `Wrapped`'s delta sites as a group, stops at the first
/// non-`Wrapped` boundary, then reverses the groups so the earliest capture
/// leads.
fn chain_sites(err: &(dyn Error + 'static)) -> Vec<Site> {
    let mut start = None;
    for e in chain(err) {
        if let Some(w) = e.downcast_ref::<Wrapped>() {
            start = Some(w);
            break;
        }
    }
    let Some(mut current) = start else {
        return Vec::new();
    };

    let mut groups: Vec<&[Site]> = Vec::new();
    loop {
        groups.push(current.sites());
        match current.source().and_then(|s| s.downcast_ref::<Wrapped>()) {
            Some(next) => current = next,
            None => break,
        }
    }

    groups.into_iter().rev().flatten().copied().collect()
}

/// The first structural context recorded at or below `root`.
fn recorded_context(root: &Wrapped) -> Option<Map<String, Value>> {
    let mut current: &(dyn Error + 'static) = root;
    while let Some(w) = current.downcast_ref::<Wrapped>() {
        if let Some(context) = w.context() {
            return Some(context.clone());
        }
        match w.source() {
            Some(next) => current = next,
            None => break,
        }
    }
    None
}

/// Pretty-print a context map with 4-space indentation.
///
/// `serde_json`'s default `Map` iterates in key order, so the output is
/// key-sorted without extra work.
fn pretty_json(map: &Map<String, Value>) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    map.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
