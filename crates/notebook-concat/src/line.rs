//! Line index over the concatenated document.
//!
//! Lines are immutable values regenerated in full whenever the span list
//! changes. Two parallel indexes exist: one over the concatenated text and
//! one over the real (cell-authored) text; both use the same `Line` type and
//! the same global numbering discipline.

use crate::position::{Position, Range};

/// One line of a document, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// URI of the owning cell.
    pub cell_uri: String,
    /// Global 0-based line number within its index.
    pub line_number: u32,
    /// Character offset of the line start within its index's text.
    pub offset: usize,
    /// Line text, terminator excluded.
    pub text: String,
}

impl Line {
    /// Line length in characters, terminator excluded.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Offset just past the last character, terminator excluded.
    pub fn end_offset(&self) -> usize {
        self.offset + self.char_len()
    }

    /// Offset just past the line terminator.
    pub fn end_offset_including_line_break(&self) -> usize {
        self.end_offset() + 1
    }

    /// Line length in characters, terminator included.
    pub fn len_including_line_break(&self) -> usize {
        self.char_len() + 1
    }

    /// The line's range, terminator excluded.
    pub fn range(&self) -> Range {
        Range::new(
            Position::new(self.line_number, 0),
            Position::new(self.line_number, self.char_len() as u32),
        )
    }

    /// The line's range, terminator included.
    pub fn range_including_line_break(&self) -> Range {
        Range::new(
            Position::new(self.line_number, 0),
            Position::new(self.line_number, self.len_including_line_break() as u32),
        )
    }
}

/// Build a line index from ordered per-cell text.
///
/// Each cell's text is split on `\n`; one `Line` is produced per terminator.
/// The empty fragment after a trailing terminator is not stored; positions
/// at the very end of the document resolve to the virtual `(line_count, 0)`
/// instead (see [`position_at_offset`]). Line numbers and offsets accumulate
/// across cells.
pub(crate) fn build_lines<'a, I>(cell_texts: I) -> Vec<Line>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut lines = Vec::new();
    let mut line_number: u32 = 0;
    let mut offset: usize = 0;

    for (cell_uri, text) in cell_texts {
        if text.is_empty() {
            continue;
        }
        let mut pieces: Vec<&str> = text.split('\n').collect();
        if pieces.last() == Some(&"") {
            // Normalized text always ends with a terminator; the fragment
            // after it is virtual.
            pieces.pop();
        }
        for piece in pieces {
            let line = Line {
                cell_uri: cell_uri.to_string(),
                line_number,
                offset,
                text: piece.to_string(),
            };
            offset = line.end_offset_including_line_break();
            line_number += 1;
            lines.push(line);
        }
    }

    lines
}

/// Index of the line containing `offset`, where each line owns its
/// terminator. `None` when the offset is at or past the end of the text.
pub(crate) fn line_index_at_offset(lines: &[Line], offset: usize) -> Option<usize> {
    let idx = lines.partition_point(|l| l.end_offset_including_line_break() <= offset);
    (idx < lines.len()).then_some(idx)
}

/// Position of a character offset. Offsets at or past the end of the text
/// resolve to the virtual `(line_count, 0)`.
pub(crate) fn position_at_offset(lines: &[Line], offset: usize) -> Position {
    match line_index_at_offset(lines, offset) {
        Some(idx) => {
            let line = &lines[idx];
            Position::new(line.line_number, (offset - line.offset) as u32)
        }
        None => Position::new(lines.len() as u32, 0),
    }
}

/// Character offset of a position. Positions past the last line clamp to the
/// total text length; characters clamp to the line's terminator-inclusive
/// length.
pub(crate) fn offset_at_position(lines: &[Line], position: Position) -> usize {
    let Some(line) = lines.get(position.line as usize) else {
        return lines
            .last()
            .map(|l| l.end_offset_including_line_break())
            .unwrap_or(0);
    };
    line.offset + (position.character as usize).min(line.len_including_line_break())
}
