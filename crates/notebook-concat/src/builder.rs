//! Span construction for a single cell.
//!
//! Given a cell's normalized source text and the offsets at which it will be
//! placed, [`build_cell_spans`] produces the cell's span run: an optional
//! header prelude, real spans, and synthetic type-suppression spans on
//! directive lines.
//!
//! Directive lines (`%magic`, `!shell`, `await expr`, with leading whitespace
//! allowed) are syntactically invalid Python in a plain file, so each one
//! gets an inline suppression comment appended as a zero-real-width span.
//! The suffix shifts nothing in cell-local coordinates because it carries
//! empty real text.

use crate::cell_uri::CellUri;
use crate::span::{Span, SpanKind};
use regex::Regex;
use std::sync::OnceLock;

/// Fixed preamble placed before the first cell's text so the analyzer sees
/// the IPython environment primitives as defined.
pub const HEADER_PRELUDE: &str = "import IPython\nIPython.get_ipython()\n";

/// Inline suffix appended to directive lines.
pub const TYPE_IGNORE_SUFFIX: &str = " # type: ignore";

fn trigger_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(%|!|await\s)").expect("trigger pattern is valid"))
}

/// Returns `true` if `line` (terminator excluded) is a directive line that
/// needs a suppression suffix.
pub fn is_trigger_line(line: &str) -> bool {
    trigger_regex().is_match(line)
}

/// Compose the header prelude text: the fixed preamble plus an optional
/// configured header, right-padded with `\n`.
pub(crate) fn header_text(notebook_header: Option<&str>) -> String {
    let mut text = HEADER_PRELUDE.to_string();
    if let Some(header) = notebook_header
        && !header.is_empty()
    {
        text.push_str(header);
        if !header.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}

/// Inputs for [`build_cell_spans`].
#[derive(Debug, Clone, Copy)]
pub struct CellSpansRequest<'a> {
    /// The owning cell.
    pub cell: &'a CellUri,
    /// Normalized cell text: CR-free, ending with exactly one `\n`.
    pub text: &'a str,
    /// Concat offset at which the run starts.
    pub concat_offset: usize,
    /// Real offset at which the run starts.
    pub real_offset: usize,
    /// Optional configured header appended to the prelude.
    pub notebook_header: Option<&'a str>,
    /// When `false`, directive lines produce no suppression spans.
    pub directive_suppression: bool,
    /// When `true` (and the run starts at concat offset 0 and the cell is
    /// not the input cell), the run begins with the header prelude.
    pub include_header: bool,
}

/// Build the span run for one cell.
pub fn build_cell_spans(req: CellSpansRequest<'_>) -> Vec<Span> {
    let fragment = req.cell.fragment_index();
    let mut spans = Vec::new();
    let mut concat = req.concat_offset;
    let mut real = req.real_offset;

    let mut push_real = |spans: &mut Vec<Span>, concat: &mut usize, real: &mut usize, text: String| {
        if text.is_empty() {
            return;
        }
        let len = text.chars().count();
        spans.push(Span {
            cell_uri: req.cell.as_str().to_string(),
            fragment,
            kind: SpanKind::Real,
            concat_start: *concat,
            concat_end: *concat + len,
            real_start: *real,
            real_end: *real + len,
            real_text: text.clone(),
            text,
        });
        *concat += len;
        *real += len;
    };

    if req.include_header && req.concat_offset == 0 && !req.cell.is_interactive_input() {
        let text = header_text(req.notebook_header);
        let len = text.chars().count();
        spans.push(Span {
            cell_uri: req.cell.as_str().to_string(),
            fragment,
            kind: SpanKind::Header,
            concat_start: concat,
            concat_end: concat + len,
            real_start: real,
            real_end: real,
            text,
            real_text: String::new(),
        });
        concat += len;
    }

    let mut buf = String::new();
    for piece in req.text.split_inclusive('\n') {
        let content = piece.strip_suffix('\n');
        match content {
            Some(line) if req.directive_suppression && is_trigger_line(line) => {
                // Real text up to and including the directive line, without
                // its terminator; the suffix sits between the line and the
                // terminator.
                buf.push_str(line);
                push_real(&mut spans, &mut concat, &mut real, std::mem::take(&mut buf));

                let len = TYPE_IGNORE_SUFFIX.chars().count();
                spans.push(Span {
                    cell_uri: req.cell.as_str().to_string(),
                    fragment,
                    kind: SpanKind::TypeIgnore,
                    concat_start: concat,
                    concat_end: concat + len,
                    real_start: real,
                    real_end: real,
                    text: TYPE_IGNORE_SUFFIX.to_string(),
                    real_text: String::new(),
                });
                concat += len;

                buf.push('\n');
            }
            _ => buf.push_str(piece),
        }
    }
    push_real(&mut spans, &mut concat, &mut real, buf);

    spans
}
