#![warn(missing_docs)]
//! Notebook Concat - Virtual Single-Buffer View Over Notebook Cells
//!
//! # Overview
//!
//! `notebook-concat` maintains a synthetic "concatenated" document that
//! merges the source of multiple notebook cells (plus synthetic prelude and
//! suppression fragments) into one logical Python buffer, so a downstream
//! language analyzer can treat the notebook as a single file. Cell lifecycle
//! events (open/close/change/refresh) are translated incrementally into edit
//! events against the concatenated document, and positions/offsets map both
//! ways between concat coordinates and cell-local coordinates.
//!
//! # Core Features
//!
//! - **Span Engine**: ordered spans with parallel concat/real offset ranges
//! - **Synthetic Fragments**: header prelude and `# type: ignore` suffixes
//!   on directive lines, carrying zero real extent
//! - **Incremental Edits**: each inbound event yields at most one verified
//!   outbound change event
//! - **Coordinate Mapping**: bidirectional concat ↔ cell-local translation
//!   with closest-match collapse over synthetic regions
//! - **State Tracking**: strictly increasing version numbers
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document Facade (lines, text, words)       │  ← Read API
//! ├─────────────────────────────────────────────┤
//! │  Coordinate Mapper (concat ↔ cell-local)    │  ← Translation
//! ├─────────────────────────────────────────────┤
//! │  Mutation Engine (open/close/edit/refresh)  │  ← Event Application
//! ├─────────────────────────────────────────────┤
//! │  Span Builder (header, directive scan)      │  ← Span Construction
//! ├─────────────────────────────────────────────┤
//! │  Span Model + Line Indexes                  │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use notebook_concat::{CellTextItem, ConcatDocument};
//!
//! let mut doc = ConcatDocument::new();
//! let event = doc
//!     .open_cell(
//!         CellTextItem {
//!             uri: "vscode-notebook-cell:/home/me/nb.ipynb#W0".to_string(),
//!             version: 1,
//!             text: "print(1)".to_string(),
//!         },
//!         false,
//!     )
//!     .unwrap();
//!
//! // The first cell carries the header prelude.
//! assert_eq!(doc.line_count(), 3);
//! assert_eq!(event.changes[0].text, doc.get_text(None));
//! assert_eq!(doc.get_real_text(), "print(1)\n");
//! ```
//!
//! # Module Description
//!
//! - [`span`] - span model (ordered concat/real substrings)
//! - [`line`] - immutable line indexes over concat and real text
//! - [`builder`] - per-cell span construction
//! - [`document`] - state + read-only text-document facade
//! - [`events`] - typed inbound/outbound events
//! - [`cell_uri`] - cell identifier parsing and ordering keys
//! - [`identity`] - concat/notebook identity derivation
//! - [`word`] - word-boundary scanning
//!
//! The engine assumes serial event application; callers must not interleave
//! mutations with reads.

pub mod builder;
pub mod cell_uri;
pub mod document;
mod engine;
pub mod error;
pub mod events;
pub mod identity;
pub mod line;
mod mapper;
pub mod position;
pub mod span;
pub mod word;

pub use builder::{
    CellSpansRequest, HEADER_PRELUDE, TYPE_IGNORE_SUFFIX, build_cell_spans, is_trigger_line,
};
pub use cell_uri::{
    CellUri, INPUT_CELL_FRAGMENT, INTERACTIVE_INPUT_SCHEME, INTERACTIVE_SCHEME,
    NOTEBOOK_CELL_SCHEME, UNTITLED_SCHEME,
};
pub use document::{ConcatDocument, ConcatOptions, LineEnding};
pub use error::ConcatError;
pub use events::{
    CellContentChange, CellEvent, CellTextItem, ConcatChange, ConcatChangeEvent,
};
pub use identity::ConcatIdentity;
pub use line::Line;
pub use position::{Location, Position, Range};
pub use span::{Span, SpanKind, SpanList};
