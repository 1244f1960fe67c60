#![warn(missing_docs)]
//! Language-server message boundary for the `notebook-concat` span engine.
//!
//! The kernel crate works entirely on typed events; this crate owns the JSON
//! edges:
//!
//! - [`messages`] parses inbound `didOpen`/`didClose`/`didChange`/refresh
//!   payloads into [`notebook_concat::CellEvent`] values and serializes
//!   outbound [`notebook_concat::ConcatChangeEvent`]s into
//!   serialization-clean payloads (ranges carry only `start`/`end`).
//! - [`sync`] provides [`ConcatSync`], the thin wrapper a host embeds to
//!   drive a document from a notification stream.

pub mod messages;
pub mod sync;

pub use messages::{
    REFRESH_METHOD, cell_event_from_notification, concat_change_event_to_json, parse_did_change,
    parse_did_close, parse_did_open, parse_refresh,
};
pub use sync::ConcatSync;
