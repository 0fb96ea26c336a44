//! Call-site capture and resolution.
//!
//! This module provides [`Site`], the opaque token recording one point in the
//! call stack at wrap time, and [`SiteInfo`], its resolved symbolic form.

use core::fmt;
use core::panic::Location;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

// ============================================================================
// Site - opaque captured call site
// ============================================================================

/// An opaque token identifying one point in the call stack at capture time.
///
/// A `Site` is process-local: it borrows the compiler-emitted
/// `&'static Location` of the capturing call and is only meaningful for
/// introspection within the same execution. It is never persisted.
///
/// Capture happens at the call site, instantaneously, through
/// `#[track_caller]`; there is no deferred or cached stack inspection.
///
/// ## Example
///
/// ```rust
/// use tracewrap::Site;
///
/// #[track_caller]
/// fn record() -> Site {
///     Site::caller()
/// }
///
/// let site = record();
/// assert!(site.file().ends_with(".rs"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    location: &'static Location<'static>,
    /// Full path of the enclosing function (`crate::module::function`),
    /// when captured via [`Site::of`]. Plain captures leave this unset.
    function: Option<&'static str>,
}

impl Site {
    /// Capture the caller's location without a function name.
    ///
    /// This is what [`wrap()`](crate::wrap) and the `Result` adapters use.
    /// For symbol-resolved traces, prefer the [`wrap!`](crate::wrap!) macro,
    /// which captures the enclosing function through [`Site::of`].
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        Self {
            location: Location::caller(),
            function: None,
        }
    }

    /// Capture the caller's location plus the enclosing function's full path.
    ///
    /// Pass an empty closure `|| {}`; its type name embeds the parent
    /// function path at zero runtime cost. Used by the `wrap!` macro.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use tracewrap::Site;
    ///
    /// fn locate() -> Site {
    ///     Site::of(|| {})
    /// }
    ///
    /// let info = locate().resolve();
    /// assert_eq!(info.method, "locate");
    /// ```
    #[track_caller]
    #[inline]
    pub fn of<F: Fn()>(_marker: F) -> Self {
        // Type looks like: "crate::module::function::{{closure}}", with one
        // extra "::{{closure}}" segment per enclosing closure.
        let mut name = core::any::type_name::<F>();
        while let Some(stripped) = name.strip_suffix("::{{closure}}") {
            name = stripped;
        }
        Self {
            location: Location::caller(),
            function: Some(name),
        }
    }

    /// The source file of the captured call, as recorded by the compiler.
    #[inline]
    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    /// The 1-based line of the captured call.
    #[inline]
    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// The enclosing function's full path, if it was captured.
    #[inline]
    pub fn function(&self) -> Option<&'static str> {
        self.function
    }

    /// Resolve this token into a symbolic descriptor.
    ///
    /// The function path is split at its last `::` into the enclosing
    /// namespace and the bare function name. A token captured without a
    /// function name resolves with empty `package` and `method` fields.
    pub fn resolve(&self) -> SiteInfo {
        let (package, method) = match self.function {
            Some(path) => match path.rsplit_once("::") {
                Some((ns, name)) => (ns.to_owned(), name.to_owned()),
                None => (String::new(), path.to_owned()),
            },
            None => (String::new(), String::new()),
        };
        SiteInfo {
            package,
            method,
            file: self.location.file().to_owned(),
            lineno: self.location.line(),
        }
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function {
            Some(name) => write!(
                f,
                "{}:{} in {}",
                self.location.file(),
                self.location.line(),
                name
            ),
            None => write!(f, "{}:{}", self.location.file(), self.location.line()),
        }
    }
}

// ============================================================================
// SiteInfo - resolved call-site descriptor
// ============================================================================

/// The resolved form of a [`Site`]: namespace, function name, file and line.
///
/// Fields are public; a descriptor for an unresolvable symbol has empty
/// `package` and `method` strings. The literal source text is *not* stored
/// here; it is read from disk on demand via [`source_line`](Self::source_line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    /// Namespace enclosing the function (`crate::module`), empty if unknown.
    pub package: String,
    /// Bare function name, empty if unknown.
    pub method: String,
    /// Path of the source file, as embedded by the compiler.
    pub file: String,
    /// 1-based line number.
    pub lineno: u32,
}

impl SiteInfo {
    /// Read the literal source line for this descriptor from disk.
    ///
    /// Returns the whitespace-trimmed text of line `lineno` in `file`.
    /// A line number of zero, or a file shorter than the target line,
    /// yields the `"???"` placeholder; reaching end of file early is
    /// silent success, not an error. Only a failure to open (or read)
    /// the file propagates, e.g. for a binary shipped without source.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use tracewrap::SiteInfo;
    ///
    /// let info = SiteInfo {
    ///     package: String::new(),
    ///     method: String::new(),
    ///     file: "/does/not/exist.rs".into(),
    ///     lineno: 0,
    /// };
    /// // Line zero short-circuits before touching the filesystem.
    /// assert_eq!(info.source_line().unwrap(), "???");
    /// ```
    pub fn source_line(&self) -> io::Result<String> {
        if self.lineno == 0 {
            return Ok("???".to_owned());
        }

        let file = File::open(&self.file)?;
        let reader = BufReader::new(file);
        for (current, line) in reader.lines().enumerate() {
            let line = line?;
            if current + 1 == self.lineno as usize {
                return Ok(line.trim().to_owned());
            }
        }

        Ok("???".to_owned())
    }
}

impl fmt::Display for SiteInfo {
    /// Formats as `package.method:file:lineno`, dropping the symbolic prefix
    /// when the symbol was not captured.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.package.is_empty(), self.method.is_empty()) {
            (false, false) => write!(
                f,
                "{}.{}:{}:{}",
                self.package, self.method, self.file, self.lineno
            ),
            (true, false) => write!(f, "{}:{}:{}", self.method, self.file, self.lineno),
            _ => write!(f, "{}:{}", self.file, self.lineno),
        }
    }
}
