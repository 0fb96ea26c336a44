//! Unit tests for tracewrap.
//!
//! These tests are in a separate file for organization but remain in the `src/`
//! directory to retain access to `pub(crate)` items like
//! `Wrapped::chain_has_sites`.

use core::fmt;

use serde::Serialize;

use crate::{cause, chain, find_cause, is, try_unwrap_one, wrap, wrap_msg, wrap_structured};
use crate::{Site, Trace, Wrapped};

#[derive(Debug, PartialEq, Eq, Clone)]
enum TestError {
    NotFound,
    DiskFull,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::NotFound => write!(f, "not found"),
            TestError::DiskFull => write!(f, "disk full"),
        }
    }
}

impl std::error::Error for TestError {}

#[derive(Debug, Serialize)]
struct StatusError {
    #[serde(rename = "StatusCode")]
    status_code: u16,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status_code)
    }
}

impl std::error::Error for StatusError {}

#[derive(Debug, Serialize)]
struct EmptyError {}

impl fmt::Display for EmptyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "empty")
    }
}

impl std::error::Error for EmptyError {}

// ============================================================================
// Construction and display
// ============================================================================

#[test]
fn test_from_display_uses_default_string_form() {
    assert_eq!(Wrapped::from_display(123).to_string(), "123");
    assert_eq!(Wrapped::from_display("boom").to_string(), "boom");
}

#[test]
fn test_new_renders_like_its_cause() {
    let err = Wrapped::new(TestError::DiskFull);
    assert_eq!(err.to_string(), "disk full");
    assert_eq!(err.message(), None);
    assert!(!err.has_sites());
}

#[test]
fn test_messages_accumulate_outermost_first() {
    let err = wrap_msg(
        wrap_msg(TestError::DiskFull, "flush failed"),
        "commit failed",
    );
    assert_eq!(err.to_string(), "commit failed: flush failed: disk full");
}

#[test]
fn test_wrap_without_message_keeps_cause_rendering() {
    let err = wrap(TestError::NotFound);
    assert_eq!(err.to_string(), "not found");
}

// ============================================================================
// Delta-site accounting
// ============================================================================

#[test]
fn test_wrapping_foreign_error_creates_sited_holder() {
    let err = wrap(TestError::DiskFull);

    // The outer wrap carries no sites of its own; the site landed on the
    // holder it nested the foreign error into.
    assert!(!err.has_sites());
    assert!(err.chain_has_sites());

    let holder = err.inner().downcast_ref::<Wrapped>().unwrap();
    assert_eq!(holder.sites().len(), 1);
    assert!(holder.inner().is::<TestError>());
}

#[test]
fn test_wrapping_sited_chain_records_one_delta_site() {
    let inner = wrap(TestError::DiskFull);
    let outer = wrap_msg(inner, "flush failed");

    assert_eq!(outer.sites().len(), 1);
    // Its cause is the previous wrap, not a fresh holder.
    let previous = outer.inner().downcast_ref::<Wrapped>().unwrap();
    assert!(!previous.has_sites());
    assert!(previous.chain_has_sites());
}

#[test]
fn test_n_wraps_record_n_sites() {
    let mut err = wrap(TestError::DiskFull);
    for depth in 0..4 {
        err = wrap_msg(err, format!("layer {depth}"));
    }
    let trace = Trace::new(&err);
    // Holder + 4 delta wraps.
    assert_eq!(trace.stack().len(), 5);
}

#[test]
fn test_wrapping_unsited_wrapped_nests_it_in_a_holder() {
    let plain = Wrapped::new(TestError::NotFound);
    assert!(!plain.chain_has_sites());

    let err = wrap_msg(plain, "lookup failed");
    assert!(!err.has_sites());
    let holder = err.inner().downcast_ref::<Wrapped>().unwrap();
    assert_eq!(holder.sites().len(), 1);
    assert!(holder.inner().is::<Wrapped>());
}

#[test]
fn test_sites_resolve_to_capture_file() {
    let err = wrap(TestError::DiskFull);
    let holder = err.inner().downcast_ref::<Wrapped>().unwrap();
    let resolved = holder.sites_resolved();
    assert_eq!(resolved.len(), 1);
    assert!(
        resolved[0].file.ends_with("tests.rs"),
        "expected the capture file, got: {}",
        resolved[0].file
    );
    assert!(resolved[0].lineno > 0);
}

// ============================================================================
// Site capture forms
// ============================================================================

// Module scope, so the captured path is `tracewrap::tests::locate`.
fn locate() -> Site {
    Site::of(|| {})
}

#[test]
fn test_site_of_captures_enclosing_function() {
    let info = locate().resolve();
    assert_eq!(info.method, "locate");
    assert!(
        info.package.ends_with("tests"),
        "expected the enclosing module path, got: {}",
        info.package
    );
}

#[test]
fn test_site_of_inside_closures_resolves_the_enclosing_function() {
    let err: Wrapped = (|| crate::wrap!(TestError::DiskFull, "inside closure"))();
    let holder = err.inner().downcast_ref::<Wrapped>().unwrap();
    let info = &holder.sites_resolved()[0];
    assert_eq!(
        info.method, "test_site_of_inside_closures_resolves_the_enclosing_function",
        "closure segments must be stripped, got package: {}",
        info.package
    );
}

#[test]
fn test_plain_capture_resolves_without_symbols() {
    let info = Site::caller().resolve();
    assert!(info.package.is_empty());
    assert!(info.method.is_empty());
    assert!(info.file.ends_with("tests.rs"));
}

#[test]
fn test_site_info_display_degrades_with_missing_symbols() {
    let full = crate::SiteInfo {
        package: "app::store".into(),
        method: "flush".into(),
        file: "src/store.rs".into(),
        lineno: 42,
    };
    assert_eq!(full.to_string(), "app::store.flush:src/store.rs:42");

    let no_package = crate::SiteInfo {
        package: String::new(),
        ..full.clone()
    };
    assert_eq!(no_package.to_string(), "flush:src/store.rs:42");

    let bare = crate::SiteInfo {
        package: String::new(),
        method: String::new(),
        ..full
    };
    assert_eq!(bare.to_string(), "src/store.rs:42");
}

// ============================================================================
// Chain walking
// ============================================================================

#[test]
fn test_chain_starts_at_the_error_itself() {
    let err = wrap_msg(TestError::DiskFull, "flush failed");
    let rendered: Vec<String> = chain(&err).map(|e| e.to_string()).collect();
    assert_eq!(rendered.first().unwrap(), "flush failed: disk full");
    assert_eq!(rendered.last().unwrap(), "disk full");
}

#[test]
fn test_cause_returns_deepest_sited_wrap() {
    let err = wrap_msg(wrap_msg(TestError::DiskFull, "flush failed"), "b");
    let root = cause(&err);
    // The root still renders the original failure without upper messages.
    assert_eq!(root.to_string(), "disk full");
    let root = root.downcast_ref::<Wrapped>().unwrap();
    assert!(root.has_sites());
}

#[test]
fn test_cause_falls_back_to_chain_end_without_sites() {
    let plain = Wrapped::new(Wrapped::new(TestError::NotFound));
    assert!(cause(&plain).is::<TestError>());
}

#[test]
fn test_cause_of_terminal_error_is_itself() {
    let terminal = TestError::NotFound;
    assert!(cause(&terminal).is::<TestError>());
}

#[test]
fn test_is_sees_through_wrapping() {
    let err = wrap_msg(wrap(TestError::DiskFull), "flush failed");
    assert!(is(&err, &TestError::DiskFull));
    assert!(!is(&err, &TestError::NotFound));
}

#[test]
fn test_find_cause_returns_first_concrete_match() {
    let err = wrap_msg(TestError::DiskFull, "flush failed");
    let found: &TestError = find_cause(&err).unwrap();
    assert_eq!(*found, TestError::DiskFull);
    assert!(find_cause::<std::io::Error>(&err).is_none());
}

#[test]
fn test_walk_borrows_outlive_intermediate_calls() {
    let err = wrap_msg(TestError::DiskFull, "flush failed");

    // Borrows returned by the walkers stay tied to the error itself, so
    // they remain usable after further walks over the same chain.
    let root = cause(&err);
    let peeled = try_unwrap_one(&err).unwrap();
    let found = find_cause::<TestError>(&err);

    assert_eq!(chain(&err).count(), 3);
    assert_eq!(root.to_string(), "disk full");
    assert!(peeled.is::<Wrapped>());
    assert_eq!(found, Some(&TestError::DiskFull));
}

#[test]
fn test_try_unwrap_one_reports_terminal_errors() {
    let err = try_unwrap_one(&TestError::NotFound).unwrap_err();
    assert_eq!(err.original, "not found");
    assert!(err.to_string().contains("not supported"));

    let wrapped = wrap(TestError::NotFound);
    assert!(try_unwrap_one(&wrapped).is_ok());
}

#[test]
fn test_trace_display_wraps_non_error_failures() {
    use crate::DisplayWrapExt;

    let result: Result<(), String> = Err("parse failure".to_owned());
    let err = result.trace_display().unwrap_err();
    assert_eq!(err.to_string(), "parse failure");
    assert!(err.chain_has_sites());
}

// ============================================================================
// Structural context
// ============================================================================

#[test]
fn test_structured_capture_records_object_fields() {
    let err = wrap_structured(StatusError { status_code: 500 });
    let trace = Trace::new(&err);
    let context = trace.context().unwrap();
    assert_eq!(context["StatusCode"], 500);
}

#[test]
fn test_empty_struct_yields_no_context() {
    let err = wrap_structured(EmptyError {});
    assert!(Trace::new(&err).context().is_none());
}

#[test]
fn test_context_survives_further_wrapping() {
    let err = wrap_msg(
        wrap_structured(StatusError { status_code: 404 }),
        "lookup failed",
    );
    let trace = Trace::new(&err);
    assert_eq!(trace.context().unwrap()["StatusCode"], 404);
}

// ============================================================================
// Trace assembly
// ============================================================================

#[test]
fn test_trace_of_plain_error_has_message_only() {
    let plain = TestError::NotFound;
    let trace = Trace::new(&plain);
    assert_eq!(trace.message(), "not found");
    assert!(trace.stack().is_empty());
    assert!(trace.context().is_none());
    assert_eq!(trace.render_text(), "not found\n\n");
}

#[test]
fn test_try_new_rejects_chains_without_sites() {
    let err = Trace::try_new(&TestError::NotFound).unwrap_err();
    assert_eq!(err.original, "not found");

    let sited = wrap(TestError::NotFound);
    assert!(Trace::try_new(&sited).is_ok());
}

#[test]
fn test_trace_serializes_minimal_map_for_plain_errors() {
    let trace = Trace::new(&TestError::NotFound);
    let json = serde_json::to_value(&trace).unwrap();
    assert_eq!(json, serde_json::json!({ "error-msg": "not found" }));
}

#[test]
fn test_trace_serializes_stack_and_context_when_present() {
    let err = wrap_msg(
        wrap_structured(StatusError { status_code: 500 }),
        "request failed",
    );
    let json = serde_json::to_value(Trace::new(&err)).unwrap();

    assert_eq!(json["error-msg"], "request failed: status 500");
    assert_eq!(json["error-ctx"]["StatusCode"], 500);
    let stack = json["stack"].as_array().unwrap();
    assert_eq!(stack.len(), 2);
    assert!(stack[0]["file"].as_str().unwrap().ends_with("tests.rs"));
}

#[cfg(feature = "smallvec-sites")]
#[test]
fn test_inline_site_storage_matches_default_accounting() {
    // Same accounting as the Vec-backed default: one site per wrap,
    // concatenated deepest-first.
    let mut err = wrap(TestError::DiskFull);
    for depth in 0..6 {
        err = wrap_msg(err, format!("layer {depth}"));
    }
    let trace = Trace::new(&err);
    assert_eq!(trace.stack().len(), 7);
    assert!(err.chain_has_sites());
}

#[test]
fn test_frames_are_deepest_capture_first() {
    let inner = wrap_msg(TestError::DiskFull, "flush failed"); // line A
    let outer = wrap_msg(inner, "commit failed"); // line B, below A
    let trace = Trace::new(&outer);
    assert_eq!(trace.stack().len(), 2);
    assert!(
        trace.stack()[0].lineno < trace.stack()[1].lineno,
        "deepest capture must lead: {:?}",
        trace.stack()
    );
}
