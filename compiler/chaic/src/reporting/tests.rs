#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use crate::Engine;
use chai_boxed::{BacktraceFrame, EvalBacktrace, EvalNote};

#[test]
fn test_report_names_file_and_message() {
    let source = "var x = 1 / 0";
    let err = Engine::builder().capture_output().build().eval(source).unwrap_err();
    let rendered = render_error(&err, "main.chai", source, false);
    assert!(rendered.contains("main.chai"), "{rendered}");
    assert!(rendered.contains("division by zero"), "{rendered}");
    assert!(rendered.contains("arithmetic_error"), "{rendered}");
}

#[test]
fn test_parse_error_is_labelled() {
    let source = "var = 3";
    let err = Engine::new().eval(source).unwrap_err();
    let rendered = render_error(&err, "bad.chai", source, false);
    assert!(rendered.contains("parse error"), "{rendered}");
    assert!(rendered.contains("bad.chai"), "{rendered}");
}

#[test]
fn test_span_outside_source_falls_back_to_plain() {
    let err = EvalError::new("elsewhere")
        .with_span(chai_ir::Span::new(100, 120))
        .with_note(EvalNote::new("while loading lib.chai"));
    let rendered = render_error(&ChaiError::Eval(err), "main.chai", "1", false);
    assert_eq!(
        rendered,
        "error: elsewhere\n  note: while loading lib.chai\n"
    );
}

#[test]
fn test_backtrace_follows_report() {
    let err = EvalError::new("deep").with_backtrace(EvalBacktrace::new(vec![BacktraceFrame {
        name: "inner".into(),
        span: None,
    }]));
    let rendered = render_error(&ChaiError::Eval(err), "main.chai", "", false);
    assert!(rendered.starts_with("error: deep\n"), "{rendered}");
    assert!(rendered.contains("0: inner"), "{rendered}");
}
