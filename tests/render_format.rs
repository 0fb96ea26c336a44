//! Tests locking down the rendered trace layout.
//!
//! The text format is consumed by humans reading logs, so its shape is part
//! of the public contract: message first, then the optional 4-space JSON
//! context block, then the frame list, each section separated by a blank
//! line.

use core::fmt;

use serde::Serialize;
use tracewrap::{wrap, wrap_msg, wrap_structured, Trace, Wrapped};

#[derive(Debug)]
struct DiskFull;

impl fmt::Display for DiskFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "disk full")
    }
}

impl std::error::Error for DiskFull {}

#[derive(Debug, Serialize)]
struct HttpError {
    #[serde(rename = "StatusCode")]
    status_code: u16,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http request failed")
    }
}

impl std::error::Error for HttpError {}

#[derive(Debug, Serialize)]
struct Featureless {}

impl fmt::Display for Featureless {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "featureless failure")
    }
}

impl std::error::Error for Featureless {}

fn flush_stage() -> Result<(), Wrapped> {
    Err(tracewrap::wrap!(DiskFull, "flush failed"))
}

fn commit_stage() -> Result<(), Wrapped> {
    flush_stage().map_err(|e| tracewrap::wrap!(e, "commit failed"))?;
    Ok(())
}

#[test]
fn message_leads_and_accumulates_outermost_first() {
    let err = commit_stage().unwrap_err();
    let output = Trace::new(&err).render_text();

    assert!(
        output.starts_with("commit failed: flush failed: disk full\n\n"),
        "message and blank line must lead. Got:\n{}",
        output
    );
    assert!(output.ends_with('\n'), "output must end with a newline");
}

#[test]
fn frames_carry_symbols_file_line_and_source() {
    let err = commit_stage().unwrap_err();
    let output = Trace::new(&err).render_text();

    assert!(
        output.contains(".flush_stage:tests/render_format.rs:"),
        "deep frame must carry the enclosing function. Got:\n{}",
        output
    );
    assert!(
        output.contains(".commit_stage:tests/render_format.rs:"),
        "shallow frame must carry the enclosing function. Got:\n{}",
        output
    );
    // The source line is read back from this very file, tab-indented.
    assert!(
        output.contains("\tErr(tracewrap::wrap!(DiskFull, \"flush failed\"))"),
        "frame must include its tab-indented source line. Got:\n{}",
        output
    );

    // Deepest capture leads.
    let flush_pos = output.find(".flush_stage:").unwrap();
    let commit_pos = output.find(".commit_stage:").unwrap();
    assert!(
        flush_pos < commit_pos,
        "frames must be deepest-first. Got:\n{}",
        output
    );
}

#[test]
fn context_block_is_four_space_indented_json() {
    let err = wrap_msg(
        wrap_structured(HttpError { status_code: 500 }),
        "fetch failed",
    );
    let output = Trace::new(&err).render_text();

    assert!(
        output.contains("{\n    \"StatusCode\": 500\n}\n\n"),
        "context must render as a 4-space JSON block. Got:\n{}",
        output
    );
    assert!(
        output.starts_with("fetch failed: http request failed\n\n{"),
        "context block must directly follow the message. Got:\n{}",
        output
    );
}

#[test]
fn featureless_error_renders_no_context_block() {
    let err = wrap_structured(Featureless {});
    let output = Trace::new(&err).render_text();

    // The source-line echo may contain braces, so check the section
    // structure: no JSON block opener, and the frame header directly
    // follows the message's blank line.
    assert!(
        !output.contains("{\n"),
        "an empty structure must not produce a context block. Got:\n{}",
        output
    );
    assert!(
        output.starts_with("featureless failure\n\ntests/render_format.rs:"),
        "frames must directly follow the message. Got:\n{}",
        output
    );
}

#[test]
fn unwrapped_error_renders_message_only() {
    let plain = DiskFull;
    let output = Trace::new(&plain).render_text();
    assert_eq!(output, "disk full\n\n");
}

#[test]
fn json_form_uses_stable_keys() {
    let err = wrap_msg(
        wrap_structured(HttpError { status_code: 404 }),
        "fetch failed",
    );
    let json = serde_json::to_value(Trace::new(&err)).unwrap();

    assert_eq!(json["error-msg"], "fetch failed: http request failed");
    assert_eq!(json["error-ctx"], serde_json::json!({ "StatusCode": 404 }));

    let stack = json["stack"].as_array().unwrap();
    assert!(!stack.is_empty());
    for frame in stack {
        assert!(frame["file"].as_str().unwrap().ends_with("render_format.rs"));
        assert!(frame["lineno"].as_u64().unwrap() > 0);
    }
}

#[test]
fn json_form_omits_absent_sections() {
    let json = serde_json::to_value(Trace::new(&DiskFull)).unwrap();
    assert_eq!(json, serde_json::json!({ "error-msg": "disk full" }));
}

#[test]
fn plain_wrap_frames_degrade_to_file_line_headers() {
    let err = wrap(DiskFull);
    let output = Trace::new(&err).render_text();

    assert!(
        output.contains("\ntests/render_format.rs:"),
        "plain captures render bare file:line headers. Got:\n{}",
        output
    );
    assert!(
        !output.contains(".wrap:"),
        "no synthetic symbol may be invented. Got:\n{}",
        output
    );
}
