//! Crate error type.

use thiserror::Error;

/// Errors surfaced by the concatenated document.
#[derive(Debug, Error)]
pub enum ConcatError {
    /// Generic offset/position lookups are refused on the concat facade: the
    /// document's real coordinates are discontiguous, so only the
    /// cell-aware mapping APIs give meaningful answers.
    #[error(
        "offset/position lookups on the concatenated document are ambiguous; \
         use the cell-aware mapping APIs instead"
    )]
    AmbiguousCoordinateLookup,

    /// A line index fell outside the document.
    #[error("line {0} is out of range")]
    LineOutOfRange(u32),

    /// A cell had no content in the concatenated document.
    #[error("cell {0} has no content in the concatenated document")]
    UnknownCell(String),
}
