//! Typed inbound and outbound events.
//!
//! Inbound events mirror the language-server document lifecycle shapes;
//! outbound events describe the resulting edits against the concatenated
//! document. Both are plain data; the protocol crate owns (de)serialization.

use crate::position::Range;

/// A cell document reference with its text, as delivered by open/refresh
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTextItem {
    /// Cell URI.
    pub uri: String,
    /// Document version reported by the editor.
    pub version: i32,
    /// Full cell source (not yet normalized).
    pub text: String,
}

/// One content change of a cell edit, in cell-local coordinates.
///
/// A change without a range means "insert at the beginning": it defaults to
/// the zero range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellContentChange {
    /// Replaced cell-local range; `None` defaults to `(0,0)..(0,0)`.
    pub range: Option<Range>,
    /// Replacement text.
    pub text: String,
}

impl CellContentChange {
    /// The change's range, defaulting to the zero range when absent.
    pub fn range_or_zero(&self) -> Range {
        self.range.unwrap_or_else(Range::zero)
    }
}

/// An inbound cell lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    /// A cell document was opened.
    Open {
        /// The opened cell.
        cell: CellTextItem,
        /// Append to the end of the span list regardless of fragment order.
        force_append: bool,
    },
    /// A cell document was closed.
    Close {
        /// URI of the closed cell.
        uri: String,
    },
    /// A cell document changed.
    Change {
        /// URI of the edited cell.
        uri: String,
        /// Content changes, applied in order.
        changes: Vec<CellContentChange>,
    },
    /// The full cell set was re-seeded (reorder, insert, delete).
    Refresh {
        /// Cells in their new order.
        cells: Vec<CellTextItem>,
    },
}

/// One edit against the concatenated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatChange {
    /// Replaced range in concat coordinates.
    pub range: Range,
    /// Character offset of `range.start`.
    pub range_offset: usize,
    /// Length of the replaced text in characters.
    pub range_length: usize,
    /// Replacement text.
    pub text: String,
}

/// The single outbound event produced by an accepted inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatChangeEvent {
    /// URI of the concatenated document.
    pub uri: String,
    /// Document version after the mutation.
    pub version: i32,
    /// Edits in application order.
    pub changes: Vec<ConcatChange>,
}
