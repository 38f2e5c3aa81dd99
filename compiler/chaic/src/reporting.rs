//! Error rendering for terminals.
//!
//! Errors with a span inside the given source get an ariadne report with
//! the offending range labelled; anything else is rendered as a plain
//! `error: ...` line. The script backtrace, if any, follows the report.

use crate::exception::ChaiError;
use ariadne::{Config, Label, Report, ReportKind, Source};
use chai_boxed::EvalError;
use std::fmt::Write as _;

/// Render `error` raised while evaluating `source` (named `file`).
pub fn render_error(error: &ChaiError, file: &str, source: &str, color: bool) -> String {
    match error.eval_error() {
        Some(err) => render_eval_error(err, file, source, color),
        None => format!("error: {error}\n"),
    }
}

fn render_eval_error(err: &EvalError, file: &str, source: &str, color: bool) -> String {
    let mut out = match err.span.map(|span| span.to_range()) {
        Some(range) if range.end <= source.len() => {
            let mut report = Report::build(ReportKind::Error, file, range.start)
                .with_config(Config::default().with_color(color))
                .with_message(&err.message)
                .with_label(Label::new((file, range)).with_message(err.kind.category()));
            for note in &err.notes {
                report = report.with_note(&note.message);
            }

            let mut buf = Vec::new();
            match report
                .finish()
                .write((file, Source::from(source)), &mut buf)
            {
                Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
                Err(_) => plain(err),
            }
        }
        _ => plain(err),
    };

    if let Some(backtrace) = err.backtrace.as_ref().filter(|b| !b.is_empty()) {
        let _ = write!(out, "{backtrace}");
    }
    out
}

fn plain(err: &EvalError) -> String {
    let mut out = format!("error: {}\n", err.message);
    for note in &err.notes {
        let _ = writeln!(out, "  note: {}", note.message);
    }
    out
}

#[cfg(test)]
mod tests;
