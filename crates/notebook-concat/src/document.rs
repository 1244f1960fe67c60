//! The concatenated document: state and read-only facade.
//!
//! # Overview
//!
//! `ConcatDocument` owns the span list, the two line indexes derived from it,
//! the version counter, and the document identity. Mutation lives in the
//! engine (`open_cell`/`close_cell`/`change_cell`/`refresh_cells`); this
//! module exposes the text-document view consumers read between mutations:
//! line lookup, text extraction, per-cell ranges, cell enumeration, and word
//! queries.
//!
//! Generic `offset_at`/`position_at` lookups are deliberately refused: the
//! concatenated document interleaves synthetic text with cell text, so a
//! bare position is ambiguous without saying which coordinate system it
//! belongs to. The cell-aware mapping APIs (see the mapper) are the only
//! correct entry points.

use crate::error::ConcatError;
use crate::identity::ConcatIdentity;
use crate::line::{Line, build_lines, offset_at_position};
use crate::position::{Position, Range};
use crate::span::{Span, SpanList};
use crate::word;

/// Preferred newline sequence of the document. The concatenated document is
/// always LF-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

/// Construction options for a [`ConcatDocument`].
#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// When `false`, directive lines get no type-suppression spans.
    pub directive_suppression: bool,
    /// Optional extra header appended to the fixed prelude.
    pub notebook_header: Option<String>,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            directive_suppression: true,
            notebook_header: None,
        }
    }
}

/// The synthetic document that merges all notebook cells (plus synthetic
/// prelude/suppression fragments) into one logical buffer.
#[derive(Debug, Clone, Default)]
pub struct ConcatDocument {
    pub(crate) spans: SpanList,
    pub(crate) concat_lines: Vec<Line>,
    pub(crate) real_lines: Vec<Line>,
    pub(crate) version: i32,
    pub(crate) closed: bool,
    pub(crate) identity: Option<ConcatIdentity>,
    pub(crate) options: ConcatOptions,
}

impl ConcatDocument {
    /// Create an empty document with default options.
    pub fn new() -> Self {
        Self::with_options(ConcatOptions::default())
    }

    /// Create an empty document.
    pub fn with_options(options: ConcatOptions) -> Self {
        Self {
            spans: SpanList::new(),
            concat_lines: Vec::new(),
            real_lines: Vec::new(),
            version: 0,
            closed: false,
            identity: None,
            options,
        }
    }

    /// Current document version. Strictly increases across accepted
    /// mutations.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns `true` when every cell has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Identity of the document, if a cell has been observed.
    pub fn identity(&self) -> Option<&ConcatIdentity> {
        self.identity.as_ref()
    }

    /// URI of the concatenated document (empty before the first open).
    pub fn concat_uri(&self) -> &str {
        self.identity.as_ref().map(|i| i.concat_uri.as_str()).unwrap_or("")
    }

    /// URI of the owning notebook (empty before the first open).
    pub fn notebook_uri(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.notebook_uri.as_str())
            .unwrap_or("")
    }

    /// Returns `true` for interactive-window documents, whose cells persist
    /// across closes.
    pub fn is_interactive(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.interactive)
            || self.spans.iter().any(|s| s.fragment == crate::cell_uri::INPUT_CELL_FRAGMENT)
    }

    /// The spans in concat order.
    pub fn spans(&self) -> &[Span] {
        self.spans.as_slice()
    }

    /// Lines of the concatenated text.
    pub fn concat_lines(&self) -> &[Line] {
        &self.concat_lines
    }

    /// Lines of the real (cell-authored) text.
    pub fn real_lines(&self) -> &[Line] {
        &self.real_lines
    }

    /// Number of lines in the concatenated text.
    pub fn line_count(&self) -> usize {
        self.concat_lines.len()
    }

    /// Line at `index` in the concatenated text.
    pub fn line_at(&self, index: u32) -> Option<&Line> {
        self.concat_lines.get(index as usize)
    }

    /// Line containing `position` in the concatenated text.
    pub fn line_at_position(&self, position: Position) -> Option<&Line> {
        self.line_at(position.line)
    }

    /// Full concatenated text, or the substring covered by `range`.
    pub fn get_text(&self, range: Option<Range>) -> String {
        let full = self.spans.concat_text();
        let Some(range) = range else {
            return full;
        };
        let start = offset_at_position(&self.concat_lines, range.start);
        let end = offset_at_position(&self.concat_lines, range.end).max(start);
        full.chars().skip(start).take(end - start).collect()
    }

    /// The real text: the concatenation of cell-authored text only.
    pub fn get_real_text(&self) -> String {
        self.spans.real_text()
    }

    /// Cell URIs in document order.
    pub fn cells(&self) -> Vec<String> {
        self.spans.cells()
    }

    /// Returns `true` if the cell contributes spans to this document.
    pub fn contains_cell(&self, cell_uri: &str) -> bool {
        self.spans.contains_cell(cell_uri)
    }

    /// Range covering every concat line owned by `cell_uri` (synthetic
    /// spans included), terminator-inclusive. The empty range when the cell
    /// is unknown.
    pub fn concat_range_of(&self, cell_uri: &str) -> Range {
        let mut iter = self.concat_lines.iter().filter(|l| l.cell_uri == cell_uri);
        let Some(first) = iter.next() else {
            return Range::zero();
        };
        let last = iter.last().unwrap_or(first);
        Range::new(first.range().start, last.range_including_line_break().end)
    }

    /// Range covering the concat lines holding `cell_uri`'s real spans.
    /// The empty range when the cell has no real content.
    pub fn real_range_of(&self, cell_uri: &str) -> Range {
        let mut reals = self
            .spans
            .iter()
            .filter(|s| s.cell_uri == cell_uri && s.is_real());
        let Some(first_span) = reals.next() else {
            return Range::zero();
        };
        let last_span = reals.last().unwrap_or(first_span);

        let Some(start_idx) = crate::line::line_index_at_offset(&self.concat_lines, first_span.concat_start)
        else {
            return Range::zero();
        };
        let end_off = last_span.concat_end.saturating_sub(1).max(first_span.concat_start);
        let end_idx =
            crate::line::line_index_at_offset(&self.concat_lines, end_off).unwrap_or(start_idx);

        let start_line = &self.concat_lines[start_idx];
        let end_line = &self.concat_lines[end_idx];
        Range::new(start_line.range().start, end_line.range_including_line_break().end)
    }

    /// The word range at `position` in the concatenated text, scanned with
    /// `pattern` (or the default word pattern when absent or unsafe).
    pub fn word_range_at_position(&self, position: Position, pattern: Option<&str>) -> Option<Range> {
        let line = self.line_at(position.line)?;
        let regex = word::validated_word_regex(pattern);
        let (start_col, end_col) = word::word_at(&line.text, position.character as usize, &regex)?;
        // The scanner reports 1-based columns.
        Some(Range::new(
            Position::new(line.line_number, (start_col - 1) as u32),
            Position::new(line.line_number, (end_col - 1) as u32),
        ))
    }

    /// Refused: see the module docs. Use the cell-aware mapping APIs.
    pub fn offset_at(&self, _position: Position) -> Result<usize, ConcatError> {
        Err(ConcatError::AmbiguousCoordinateLookup)
    }

    /// Refused: see the module docs. Use the cell-aware mapping APIs.
    pub fn position_at(&self, _offset: usize) -> Result<Position, ConcatError> {
        Err(ConcatError::AmbiguousCoordinateLookup)
    }

    /// The document has no durable storage; saving never succeeds.
    pub fn save(&self) -> bool {
        false
    }

    /// The document is always considered dirty.
    pub fn is_dirty(&self) -> bool {
        true
    }

    /// The document never corresponds to a file on disk.
    pub fn is_untitled(&self) -> bool {
        true
    }

    /// Language of the concatenated document.
    pub fn language_id(&self) -> &'static str {
        "python"
    }

    /// Newline convention of the concatenated document.
    pub fn eol(&self) -> LineEnding {
        LineEnding::Lf
    }

    /// Regenerate both line indexes from the span list.
    pub(crate) fn rebuild_lines(&mut self) {
        let cells = self.spans.cells();
        self.concat_lines = build_lines(cells.iter().map(|cell| {
            let text: String = self
                .spans
                .iter()
                .filter(|s| &s.cell_uri == cell)
                .map(|s| s.text.as_str())
                .collect();
            (cell.as_str(), text)
        }));
        self.real_lines = build_lines(cells.iter().map(|cell| {
            let text: String = self
                .spans
                .iter()
                .filter(|s| &s.cell_uri == cell)
                .map(|s| s.real_text.as_str())
                .collect();
            (cell.as_str(), text)
        }));
    }
}
