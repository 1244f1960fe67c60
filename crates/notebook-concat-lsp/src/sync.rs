//! Document synchronization wrapper.
//!
//! [`ConcatSync`] owns a [`ConcatDocument`] and wires raw notification
//! payloads into it, handing back the serialized outbound event a host
//! should forward to its analyzer.

use crate::messages::{cell_event_from_notification, concat_change_event_to_json};
use notebook_concat::{ConcatDocument, ConcatOptions};
use serde_json::Value;
use tracing::debug;

/// Wires a stream of document lifecycle notifications into a concatenated
/// document.
#[derive(Debug, Default)]
pub struct ConcatSync {
    document: ConcatDocument,
}

impl ConcatSync {
    /// Create a sync wrapper with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sync wrapper with explicit document options.
    pub fn with_options(options: ConcatOptions) -> Self {
        Self {
            document: ConcatDocument::with_options(options),
        }
    }

    /// The wrapped document.
    pub fn document(&self) -> &ConcatDocument {
        &self.document
    }

    /// Handle one inbound notification. Returns the serialized outbound
    /// change event when the notification mutated the document.
    pub fn handle_notification(&mut self, method: &str, params: &Value) -> Option<Value> {
        let event = cell_event_from_notification(method, params)?;
        let outbound = self.document.apply(event)?;
        debug!(
            uri = outbound.uri.as_str(),
            version = outbound.version,
            changes = outbound.changes.len(),
            "forwarding concat change event"
        );
        Some(concat_change_event_to_json(&outbound))
    }
}
