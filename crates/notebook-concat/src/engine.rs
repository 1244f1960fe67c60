//! Mutation engine: applies cell lifecycle events to the span list.
//!
//! # Overview
//!
//! Every inbound event is translated into at most one outbound
//! [`ConcatChangeEvent`] describing the same mutation against the
//! concatenated document. The consumer gets no second chance to reconcile,
//! so each emitted change must replay to exactly the engine's own post-state:
//! the edit translator verifies this before taking the cheaper partial-edit
//! path and falls back to a whole-cell replacement otherwise.
//!
//! The engine assumes serial application; no internal locking. Version
//! numbers increase strictly across accepted events and are the only
//! observable fence for readers.
//!
//! # Header ownership
//!
//! The header prelude exists at most once and always at concat offset 0. An
//! open that inserts a new first cell, or a close that removes the old one,
//! transplants the header to the current first cell so span runs stay
//! contiguous per cell; the emitted event covers only the net text
//! difference (the header text itself never changes within a document).

use crate::builder::{CellSpansRequest, build_cell_spans, header_text};
use crate::cell_uri::{CellUri, INPUT_CELL_FRAGMENT};
use crate::document::ConcatDocument;
use crate::error::ConcatError;
use crate::events::{CellContentChange, CellEvent, CellTextItem, ConcatChange, ConcatChangeEvent};
use crate::identity::ConcatIdentity;
use crate::line::position_at_offset;
use crate::position::{Position, Range};
use crate::span::{Span, SpanKind};
use tracing::warn;

/// Strip carriage returns and guarantee a single trailing `\n`.
pub(crate) fn normalize_cell_text(text: &str) -> String {
    let mut normalized = text.replace('\r', "");
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Byte offset of the `n`-th character of `text` (its length when past the
/// end).
fn byte_of_char(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(b, _)| b).unwrap_or(text.len())
}

/// Replace the character range `[start, end)` of `text`.
fn char_splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let start_b = byte_of_char(text, start);
    let end_b = byte_of_char(text, end);
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start_b]);
    out.push_str(replacement);
    out.push_str(&text[end_b..]);
    out
}

fn order_key(fragment: i64) -> i64 {
    if fragment == INPUT_CELL_FRAGMENT {
        i64::MAX
    } else {
        fragment
    }
}

impl ConcatDocument {
    /// Apply one inbound event, returning the outbound change event for an
    /// accepted mutation.
    pub fn apply(&mut self, event: CellEvent) -> Option<ConcatChangeEvent> {
        match event {
            CellEvent::Open { cell, force_append } => self.open_cell(cell, force_append),
            CellEvent::Close { uri } => self.close_cell(&uri),
            CellEvent::Change { uri, changes } => self.change_cell(&uri, &changes),
            CellEvent::Refresh { cells } => self.refresh_cells(cells),
        }
    }

    /// Open a cell. A second open of a known cell is ignored.
    pub fn open_cell(&mut self, cell: CellTextItem, force_append: bool) -> Option<ConcatChangeEvent> {
        if self.spans.contains_cell(&cell.uri) {
            return None;
        }
        let uri = CellUri::parse(&cell.uri);

        self.version = cell.version.max(self.version + 1);
        self.closed = false;
        if self.identity.is_none() {
            self.identity = Some(ConcatIdentity::derive(&uri));
        }

        let text = normalize_cell_text(&cell.text);
        let fragment = uri.fragment_index();

        let index = if force_append || fragment == INPUT_CELL_FRAGMENT {
            self.spans.len()
        } else {
            self.spans
                .iter()
                .position(|s| order_key(s.fragment) > fragment)
                .unwrap_or(self.spans.len())
        };

        // Inserting in front of the current header: take the header over so
        // it stays owned by the first cell.
        let mut transplanted_header = 0usize;
        if index == 0
            && let Some(first) = self.spans.get(0)
            && first.kind == SpanKind::Header
        {
            let removed = self.spans.remove_run(0..1);
            transplanted_header = removed[0].concat_len();
            self.spans.shift_from(0, -(transplanted_header as isize), 0);
        }

        let (concat_offset, real_offset) = match self.spans.get(index) {
            Some(next) => (next.concat_start, next.real_start),
            None => (self.spans.concat_len(), self.spans.real_len()),
        };

        let new_spans = build_cell_spans(CellSpansRequest {
            cell: &uri,
            text: &text,
            concat_offset,
            real_offset,
            notebook_header: self.options.notebook_header.as_deref(),
            directive_suppression: self.options.directive_suppression,
            include_header: true,
        });
        let added_concat: usize = new_spans.iter().map(Span::concat_len).sum();
        let added_real: usize = new_spans.iter().map(Span::real_len).sum();

        // The consumer still sees the pre-insertion document (header
        // included when transplanting), so the emitted insertion skips the
        // rebuilt header text.
        let (emit_offset, emit_text) = if transplanted_header > 0 {
            let text: String = new_spans
                .iter()
                .filter(|s| s.kind != SpanKind::Header)
                .map(|s| s.text.as_str())
                .collect();
            (transplanted_header, text)
        } else {
            let text: String = new_spans.iter().map(|s| s.text.as_str()).collect();
            (concat_offset, text)
        };
        let position = position_at_offset(&self.concat_lines, emit_offset);

        self.spans.shift_from(index, added_concat as isize, added_real as isize);
        self.spans.insert_at(index, new_spans);
        self.rebuild_lines();

        Some(self.emit(vec![ConcatChange {
            range: Range::new(position, position),
            range_offset: emit_offset,
            range_length: 0,
            text: emit_text,
        }]))
    }

    /// Close a cell.
    ///
    /// Interactive documents keep their cells: closing a notebook cell is a
    /// no-op there, and only closing the input cell itself clears the whole
    /// document. Otherwise the cell's spans are removed and a deletion event
    /// is emitted.
    pub fn close_cell(&mut self, cell_uri: &str) -> Option<ConcatChangeEvent> {
        let run = self.spans.run_of(cell_uri)?;

        if self.is_interactive() {
            let uri = CellUri::parse(cell_uri);
            if uri.is_interactive_input() {
                return Some(self.clear_all());
            }
            return None;
        }

        self.version += 1;

        let removed = self.spans.remove_run(run.clone());
        let start_off = removed[0].concat_start;
        let end_off = removed.last().map(|s| s.concat_end).unwrap_or(start_off);
        let removed_concat = end_off - start_off;
        let removed_real =
            removed.last().map(|s| s.real_end).unwrap_or(0) - removed[0].real_start;

        self.spans
            .shift_from(run.start, -(removed_concat as isize), -(removed_real as isize));

        // The closed cell owned the header: hand it to the next cell and
        // shrink the emitted deletion accordingly.
        let mut emit_start = start_off;
        if removed[0].kind == SpanKind::Header
            && let Some(next_first) = self.spans.get(0)
            && !CellUri::parse(&next_first.cell_uri).is_interactive_input()
        {
            let text = header_text(self.options.notebook_header.as_deref());
            let len = text.chars().count();
            let header = Span {
                cell_uri: next_first.cell_uri.clone(),
                fragment: next_first.fragment,
                kind: SpanKind::Header,
                concat_start: 0,
                concat_end: len,
                real_start: 0,
                real_end: 0,
                text,
                real_text: String::new(),
            };
            self.spans.insert_at(0, vec![header]);
            self.spans.shift_from(1, len as isize, 0);
            emit_start = len;
        }

        let range = Range::new(
            position_at_offset(&self.concat_lines, emit_start),
            position_at_offset(&self.concat_lines, end_off),
        );
        let range_length = end_off - emit_start;

        self.rebuild_lines();
        if self.spans.is_empty() {
            self.closed = true;
        }

        Some(self.emit(vec![ConcatChange {
            range,
            range_offset: emit_start,
            range_length,
            text: String::new(),
        }]))
    }

    /// Apply content changes to a cell. Changes are translated one at a
    /// time against the state produced by the previous one; a change that
    /// fails to translate is logged and skipped without losing the rest.
    pub fn change_cell(
        &mut self,
        cell_uri: &str,
        changes: &[CellContentChange],
    ) -> Option<ConcatChangeEvent> {
        if !self.spans.contains_cell(cell_uri) {
            return None;
        }
        self.version += 1;

        let mut out = Vec::with_capacity(changes.len());
        for change in changes {
            match self.apply_cell_change(cell_uri, change) {
                Ok(translated) => out.push(translated),
                Err(err) => {
                    warn!(cell = cell_uri, error = %err, "skipping content change that failed to translate");
                }
            }
        }
        Some(self.emit(out))
    }

    fn apply_cell_change(
        &mut self,
        cell_uri: &str,
        change: &CellContentChange,
    ) -> Result<ConcatChange, ConcatError> {
        let run = self
            .spans
            .run_of(cell_uri)
            .ok_or_else(|| ConcatError::UnknownCell(cell_uri.to_string()))?;
        let uri = CellUri::parse(cell_uri);
        let old_run: Vec<Span> = self.spans.as_slice()[run.clone()].to_vec();

        let first_concat = old_run[0].concat_start;
        let first_real = old_run[0].real_start;
        let last = old_run.last().expect("non-empty run");
        let old_concat_len = last.concat_end - first_concat;
        let old_real_len = last.real_end - first_real;
        let old_real_text: String = old_run.iter().map(|s| s.real_text.as_str()).collect();
        let had_header = old_run[0].kind == SpanKind::Header;

        // Resolve the cell-local range into offsets of the cell's real text.
        // A position on the virtual line after the cell's last terminator
        // resolves to the end of the cell.
        let range = change.range_or_zero();
        let cell_lines: Vec<&crate::line::Line> = self
            .real_lines
            .iter()
            .filter(|l| l.cell_uri == cell_uri)
            .collect();
        let real_len_chars = old_real_text.chars().count();
        let local_offset = |position: Position| -> Result<usize, ConcatError> {
            match cell_lines.get(position.line as usize) {
                Some(line) => {
                    let within = (position.character as usize).min(line.len_including_line_break());
                    Ok((line.offset - first_real + within).min(real_len_chars))
                }
                None if position.line as usize == cell_lines.len() => Ok(real_len_chars),
                None => Err(ConcatError::LineOutOfRange(position.line)),
            }
        };
        let start_off = local_offset(range.start)?;
        let end_off = local_offset(range.end)?.max(start_off);

        let replacement = change.text.replace('\r', "");
        let mut new_real_text = char_splice(&old_real_text, start_off, end_off, &replacement);
        let forced_newline = !new_real_text.ends_with('\n');
        if forced_newline {
            new_real_text.push('\n');
        }

        let new_spans = build_cell_spans(CellSpansRequest {
            cell: &uri,
            text: &new_real_text,
            concat_offset: first_concat,
            real_offset: first_real,
            notebook_header: self.options.notebook_header.as_deref(),
            directive_suppression: self.options.directive_suppression,
            include_header: had_header,
        });
        let new_concat_len: usize = new_spans.iter().map(Span::concat_len).sum();
        let new_real_len: usize = new_spans.iter().map(Span::real_len).sum();
        let new_cell_concat: String = new_spans.iter().map(|s| s.text.as_str()).collect();

        // Partial edit: only when the run structure is unchanged and the
        // translated concat edit provably reproduces the engine's own
        // post-edit text; otherwise replace the whole cell.
        let structural_match = !forced_newline
            && new_spans.len() == old_run.len()
            && old_run
                .iter()
                .zip(&new_spans)
                .all(|(old, new)| old.kind == new.kind && (old.is_real() || old.text == new.text));

        let mut partial = None;
        if structural_match {
            let concat_start = self.real_to_concat_left(first_real + start_off);
            let concat_end = self.real_to_concat_left(first_real + end_off).max(concat_start);

            let old_full = self.spans.concat_text();
            let engine_full = char_splice(
                &old_full,
                first_concat,
                first_concat + old_concat_len,
                &new_cell_concat,
            );
            let consumer_full = char_splice(&old_full, concat_start, concat_end, &replacement);
            if engine_full == consumer_full {
                partial = Some(ConcatChange {
                    range: Range::new(
                        position_at_offset(&self.concat_lines, concat_start),
                        position_at_offset(&self.concat_lines, concat_end),
                    ),
                    range_offset: concat_start,
                    range_length: concat_end - concat_start,
                    text: replacement,
                });
            }
        }
        let translated = partial.unwrap_or_else(|| ConcatChange {
            range: self.concat_range_of(cell_uri),
            range_offset: first_concat,
            range_length: old_concat_len,
            text: new_cell_concat,
        });

        let new_len = new_spans.len();
        self.spans.splice_run(run.clone(), new_spans);
        self.spans.shift_from(
            run.start + new_len,
            new_concat_len as isize - old_concat_len as isize,
            new_real_len as isize - old_real_len as isize,
        );
        self.rebuild_lines();

        Ok(translated)
    }

    /// Re-seed the document from a full cell list (reorder/insert/delete).
    /// Ignored for interactive documents and when the real content is
    /// already identical.
    pub fn refresh_cells(&mut self, cells: Vec<CellTextItem>) -> Option<ConcatChangeEvent> {
        if self.is_interactive() {
            return None;
        }

        let mut new_real = cells
            .iter()
            .map(|c| c.text.replace('\r', ""))
            .collect::<Vec<_>>()
            .join("\n");
        new_real.push('\n');
        if new_real == self.get_real_text() {
            return None;
        }

        let old_len = self.spans.concat_len();
        let old_range = self.full_range();

        self.spans.clear();
        self.concat_lines.clear();
        self.real_lines.clear();
        self.identity = None;
        self.closed = false;
        self.version += 1;

        for cell in cells {
            let _ = self.open_cell(cell, true);
        }

        let text = self.get_text(None);
        Some(self.emit(vec![ConcatChange {
            range: old_range,
            range_offset: 0,
            range_length: old_len,
            text,
        }]))
    }

    fn clear_all(&mut self) -> ConcatChangeEvent {
        self.version += 1;
        let removed_len = self.spans.concat_len();
        let range = self.full_range();
        self.spans.clear();
        self.concat_lines.clear();
        self.real_lines.clear();
        self.closed = true;
        self.emit(vec![ConcatChange {
            range,
            range_offset: 0,
            range_length: removed_len,
            text: String::new(),
        }])
    }

    fn full_range(&self) -> Range {
        match self.concat_lines.last() {
            Some(last) => Range::new(Position::new(0, 0), last.range_including_line_break().end),
            None => Range::zero(),
        }
    }

    fn emit(&self, changes: Vec<ConcatChange>) -> ConcatChangeEvent {
        ConcatChangeEvent {
            uri: self.concat_uri().to_string(),
            version: self.version,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(uri: &str, version: i32, text: &str) -> CellTextItem {
        CellTextItem {
            uri: uri.to_string(),
            version,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_normalize_cell_text() {
        assert_eq!(normalize_cell_text("a\r\nb"), "a\nb\n");
        assert_eq!(normalize_cell_text("a\n"), "a\n");
        assert_eq!(normalize_cell_text(""), "\n");
    }

    #[test]
    fn test_double_open_ignored() {
        let mut doc = ConcatDocument::new();
        let uri = "vscode-notebook-cell:/nb.ipynb#W0";
        assert!(doc.open_cell(item(uri, 1, "a\n"), false).is_some());
        let version = doc.version();
        assert!(doc.open_cell(item(uri, 5, "b\n"), false).is_none());
        assert_eq!(doc.version(), version);
    }

    #[test]
    fn test_version_takes_max() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W0", 7, "a\n"), false);
        assert_eq!(doc.version(), 7);
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W1", 2, "b\n"), false);
        assert_eq!(doc.version(), 8);
    }

    #[test]
    fn test_unknown_cell_edit_and_close_ignored() {
        let mut doc = ConcatDocument::new();
        assert!(doc.close_cell("vscode-notebook-cell:/nb.ipynb#W0").is_none());
        assert!(doc.change_cell("vscode-notebook-cell:/nb.ipynb#W0", &[]).is_none());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_fragment_ordering_on_open() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W0", 1, "a\n"), false);
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W2", 1, "c\n"), false);
        // W1 lands between W0 and W2.
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W1", 1, "b\n"), false);

        let fragments: Vec<i64> = doc.spans().iter().map(|s| s.fragment).collect();
        assert!(fragments.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(doc.get_real_text(), "a\nb\nc\n");
    }

    #[test]
    fn test_open_before_first_cell_moves_header() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W1", 1, "b\n"), false);
        let event = doc
            .open_cell(item("vscode-notebook-cell:/nb.ipynb#W0", 1, "a\n"), false)
            .unwrap();

        // Exactly one header, at offset 0, owned by the new first cell.
        let headers: Vec<&Span> = doc.spans().iter().filter(|s| s.kind == SpanKind::Header).collect();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].concat_start, 0);
        assert!(headers[0].cell_uri.ends_with("#W0"));

        // The emitted insertion lands after the header lines.
        assert_eq!(event.changes.len(), 1);
        assert_eq!(event.changes[0].range.start, Position::new(2, 0));
        assert_eq!(event.changes[0].text, "a\n");
        assert_eq!(doc.get_real_text(), "a\nb\n");
    }

    #[test]
    fn test_close_shifts_real_offsets() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W0", 1, "aa\n"), false);
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W1", 1, "bb\n"), false);
        doc.close_cell("vscode-notebook-cell:/nb.ipynb#W0");

        // The remaining cell's real run starts back at offset 0.
        let real: Vec<&Span> = doc.spans().iter().filter(|s| s.is_real()).collect();
        assert_eq!(real[0].real_start, 0);
        assert_eq!(doc.get_real_text(), "bb\n");
    }

    #[test]
    fn test_interactive_close_of_notebook_cell_is_noop() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-interactive-input:/Input-1", 1, "x\n"), false);
        doc.open_cell(item("vscode-notebook-cell:/Input-1#W1", 1, "y\n"), false);

        assert!(doc.close_cell("vscode-notebook-cell:/Input-1#W1").is_none());
        assert!(doc.contains_cell("vscode-notebook-cell:/Input-1#W1"));

        // Closing the input cell clears everything.
        let event = doc.close_cell("vscode-interactive-input:/Input-1").unwrap();
        assert!(doc.is_closed());
        assert_eq!(doc.spans().len(), 0);
        assert_eq!(event.changes[0].range_offset, 0);
    }

    #[test]
    fn test_refresh_ignored_when_identical() {
        let mut doc = ConcatDocument::new();
        doc.open_cell(item("vscode-notebook-cell:/nb.ipynb#W0", 1, "a\n"), false);
        assert!(doc.refresh_cells(vec![item("vscode-notebook-cell:/nb.ipynb#W0", 1, "a")]).is_none());
    }
}
