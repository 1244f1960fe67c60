//! Bidirectional coordinate mapping between concat and cell-local
//! coordinates.
//!
//! Real offsets address the cell-authored text only; concat offsets address
//! the full synthetic buffer. Synthetic spans collapse to their anchor (the
//! real offset they were inserted at), so queries landing inside them snap to
//! the nearest real coordinate. All operations are total: coordinates that
//! fall outside real content come back as sentinels rather than errors.

use crate::document::ConcatDocument;
use crate::line::{Line, line_index_at_offset, offset_at_position, position_at_offset};
use crate::position::{Location, Position, Range};

impl ConcatDocument {
    /// Map a real offset to its concat offset. Offsets outside every real
    /// span pass through unchanged.
    pub fn real_to_concat(&self, real_offset: usize) -> usize {
        match self.spans.real_span_at(real_offset) {
            Some(span) => real_offset - span.real_start + span.concat_start,
            None => real_offset,
        }
    }

    /// Map a concat offset to the closest real offset. Inside a real span
    /// this is exact; inside a synthetic span it collapses to the span's
    /// anchor. Offsets outside every span pass through unchanged.
    pub fn concat_to_closest_real(&self, concat_offset: usize) -> usize {
        match self.spans.span_at(concat_offset) {
            Some(span) if span.is_real() => concat_offset - span.concat_start + span.real_start,
            Some(span) => span.real_start,
            None => concat_offset,
        }
    }

    /// First line of `cell_uri`'s real content.
    pub(crate) fn first_real_line_of(&self, cell_uri: &str) -> Option<&Line> {
        self.real_lines.iter().find(|l| l.cell_uri == cell_uri)
    }

    /// Map a cell-local position to a concat position. `(0, 0)` when the
    /// cell has no real content.
    pub fn concat_position_of(&self, cell_uri: &str, position: Position) -> Position {
        let Some(offset) = self.cell_position_to_concat_offset(cell_uri, position) else {
            return Position::new(0, 0);
        };
        position_at_offset(&self.concat_lines, offset)
    }

    /// Map a cell-local position to a concat offset. `0` when the cell has
    /// no real content.
    pub fn concat_offset_of(&self, cell_uri: &str, position: Position) -> usize {
        self.cell_position_to_concat_offset(cell_uri, position)
            .unwrap_or(0)
    }

    fn cell_position_to_concat_offset(&self, cell_uri: &str, position: Position) -> Option<usize> {
        let first = self.first_real_line_of(cell_uri)?;
        let line_idx = first.line_number as usize + position.line as usize;
        let line = self.real_lines.get(line_idx)?;
        let real_offset =
            line.offset + (position.character as usize).min(line.len_including_line_break());
        Some(self.real_to_concat(real_offset))
    }

    /// Project a concat position into the owning cell's local coordinates.
    /// Positions in synthetic territory collapse to the anchor's cell
    /// position; positions outside the document come back as `(0, 0)`.
    pub fn notebook_position_of(&self, position: Position) -> Position {
        let concat_offset = offset_at_position(&self.concat_lines, position);
        self.notebook_position_of_offset(concat_offset)
    }

    fn notebook_position_of_offset(&self, concat_offset: usize) -> Position {
        let real_offset = self.concat_to_closest_real(concat_offset);
        let Some(idx) = line_index_at_offset(&self.real_lines, real_offset) else {
            return Position::new(0, 0);
        };
        let line = &self.real_lines[idx];
        let Some(first) = self.first_real_line_of(&line.cell_uri) else {
            return Position::new(0, 0);
        };
        Position::new(
            line.line_number - first.line_number,
            (real_offset - line.offset) as u32,
        )
    }

    /// Resolve a concat range to the cell it lands in and the corresponding
    /// cell-local range. The start snaps forward to the first real span
    /// overlapping the range; a range touching no real span yields an empty
    /// cell URI and the input range unchanged.
    pub fn notebook_location_of(&self, range: Range) -> Location {
        let start_offset = offset_at_position(&self.concat_lines, range.start);
        let end_offset = offset_at_position(&self.concat_lines, range.end).max(start_offset);
        // Probe point queries as a one-character range.
        let probe_end = end_offset.max(start_offset + 1);

        let overlap = self
            .spans
            .iter()
            .find(|s| s.is_real() && s.concat_start < probe_end && start_offset < s.concat_end);
        let Some(span) = overlap else {
            return Location {
                uri: String::new(),
                range,
            };
        };

        let snapped_start = start_offset.max(span.concat_start);
        Location {
            uri: span.cell_uri.clone(),
            range: Range::new(
                self.notebook_position_of_offset(snapped_start),
                self.notebook_position_of_offset(end_offset),
            ),
        }
    }

    /// Map a concat offset to a cell-local real offset.
    pub fn notebook_offset_of(&self, cell_uri: &str, concat_offset: usize) -> usize {
        let closest = self.concat_to_closest_real(concat_offset);
        let base = self
            .spans
            .first_index_of(cell_uri)
            .and_then(|idx| self.spans.get(idx))
            .map(|s| s.real_start)
            .unwrap_or(0);
        closest.saturating_sub(base)
    }

    /// Left-biased real→concat projection used by the edit translator.
    ///
    /// Unlike [`real_to_concat`](Self::real_to_concat), an offset sitting on
    /// the boundary between two real spans resolves into the earlier span's
    /// end. Edits at a directive-line boundary must land before the
    /// suppression suffix, not after it.
    pub(crate) fn real_to_concat_left(&self, real_offset: usize) -> usize {
        let span = self
            .spans
            .iter()
            .find(|s| s.is_real() && s.real_start <= real_offset && real_offset <= s.real_end);
        match span {
            Some(span) => real_offset - span.real_start + span.concat_start,
            None => real_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConcatDocument;
    use crate::events::CellTextItem;

    fn open(doc: &mut ConcatDocument, uri: &str, text: &str) {
        doc.open_cell(
            CellTextItem {
                uri: uri.to_string(),
                version: 1,
                text: text.to_string(),
            },
            false,
        );
    }

    #[test]
    fn test_real_concat_roundtrip() {
        let mut doc = ConcatDocument::new();
        open(&mut doc, "vscode-notebook-cell:/nb.ipynb#W0", "!ls\nprint(1)\n");

        for real in 0..doc.get_real_text().chars().count() {
            let concat = doc.real_to_concat(real);
            assert_eq!(doc.concat_to_closest_real(concat), real, "offset {}", real);
        }
    }

    #[test]
    fn test_closest_real_collapses_synthetic() {
        let mut doc = ConcatDocument::new();
        open(&mut doc, "vscode-notebook-cell:/nb.ipynb#W0", "print(1)\n");

        // Offsets inside the header collapse to real offset 0.
        assert_eq!(doc.concat_to_closest_real(0), 0);
        assert_eq!(doc.concat_to_closest_real(10), 0);
    }

    #[test]
    fn test_concat_position_of() {
        let mut doc = ConcatDocument::new();
        open(&mut doc, "vscode-notebook-cell:/nb.ipynb#W0", "a = 1\nb = 2\n");

        // Cell line 1 lands after the two header lines.
        assert_eq!(
            doc.concat_position_of("vscode-notebook-cell:/nb.ipynb#W0", Position::new(1, 2)),
            Position::new(3, 2)
        );
        assert_eq!(
            doc.concat_position_of("unknown", Position::new(0, 0)),
            Position::new(0, 0)
        );
    }

    #[test]
    fn test_notebook_location_snaps_past_header() {
        let mut doc = ConcatDocument::new();
        open(&mut doc, "vscode-notebook-cell:/nb.ipynb#W0", "a = 1\n");

        // A range starting inside the header snaps to the cell's content.
        let loc = doc.notebook_location_of(Range::new(Position::new(0, 0), Position::new(2, 3)));
        assert_eq!(loc.uri, "vscode-notebook-cell:/nb.ipynb#W0");
        assert_eq!(loc.range, Range::new(Position::new(0, 0), Position::new(0, 3)));
    }

    #[test]
    fn test_notebook_location_synthetic_only() {
        let mut doc = ConcatDocument::new();
        open(&mut doc, "vscode-notebook-cell:/nb.ipynb#W0", "a = 1\n");

        // Beyond the end of the document: no overlap.
        let range = Range::new(Position::new(9, 0), Position::new(9, 1));
        let loc = doc.notebook_location_of(range);
        assert_eq!(loc.uri, "");
        assert_eq!(loc.range, range);
    }

    #[test]
    fn test_notebook_offset_of() {
        let mut doc = ConcatDocument::new();
        let uri = "vscode-notebook-cell:/nb.ipynb#W0";
        open(&mut doc, uri, "a = 1\n");

        let concat = doc.concat_offset_of(uri, Position::new(0, 4));
        assert_eq!(doc.notebook_offset_of(uri, concat), 4);
    }
}
