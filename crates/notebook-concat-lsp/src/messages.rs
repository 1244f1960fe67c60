//! Parsing and serialization of document lifecycle payloads.
//!
//! Inbound payloads follow the language-server document sync shapes
//! (`didOpen`/`didClose`/`didChange`) plus a notebook refresh notification.
//! Parsing is best-effort and total: a payload missing required fields
//! yields `None` rather than an error, matching how a host drains a
//! notification stream.
//!
//! Outbound events serialize with ranges stripped to
//! `{start: {line, character}, end: {line, character}}` only, so consumers
//! can forward them without scrubbing.

use notebook_concat::{
    CellContentChange, CellEvent, CellTextItem, ConcatChange, ConcatChangeEvent, Position, Range,
};
use serde_json::{Value, json};

/// Method name accepted for cell refresh notifications.
pub const REFRESH_METHOD: &str = "notebookDocument/refresh";

fn position_from_value(value: &Value) -> Option<Position> {
    let line = value.get("line")?.as_u64()? as u32;
    let character = value.get("character")?.as_u64()? as u32;
    Some(Position { line, character })
}

fn range_from_value(value: &Value) -> Option<Range> {
    let start = position_from_value(value.get("start")?)?;
    let end = position_from_value(value.get("end")?)?;
    Some(Range { start, end })
}

fn cell_text_item_from_value(value: &Value) -> Option<CellTextItem> {
    let doc = value.get("textDocument")?;
    Some(CellTextItem {
        uri: doc.get("uri")?.as_str()?.to_string(),
        version: doc.get("version").and_then(Value::as_i64).unwrap_or(0) as i32,
        text: doc.get("text")?.as_str()?.to_string(),
    })
}

/// Parse a `textDocument/didOpen` payload.
///
/// An optional top-level `forceAppend` flag skips fragment ordering and
/// appends the cell at the end.
pub fn parse_did_open(params: &Value) -> Option<CellEvent> {
    let cell = cell_text_item_from_value(params)?;
    let force_append = params
        .get("forceAppend")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(CellEvent::Open { cell, force_append })
}

/// Parse a `textDocument/didClose` payload.
pub fn parse_did_close(params: &Value) -> Option<CellEvent> {
    let uri = params.get("textDocument")?.get("uri")?.as_str()?.to_string();
    Some(CellEvent::Close { uri })
}

/// Parse a `textDocument/didChange` payload. A content change without a
/// range keeps `range: None` (insert-at-beginning semantics).
pub fn parse_did_change(params: &Value) -> Option<CellEvent> {
    let uri = params.get("textDocument")?.get("uri")?.as_str()?.to_string();
    let changes = params
        .get("contentChanges")?
        .as_array()?
        .iter()
        .filter_map(|change| {
            let text = change.get("text")?.as_str()?.to_string();
            let range = change.get("range").and_then(range_from_value);
            Some(CellContentChange { range, text })
        })
        .collect();
    Some(CellEvent::Change { uri, changes })
}

/// Parse a refresh payload: `{cells: [{textDocument: {...}}, ...]}`.
pub fn parse_refresh(params: &Value) -> Option<CellEvent> {
    let cells = params
        .get("cells")?
        .as_array()?
        .iter()
        .filter_map(cell_text_item_from_value)
        .collect();
    Some(CellEvent::Refresh { cells })
}

/// Parse a notification by method name.
pub fn cell_event_from_notification(method: &str, params: &Value) -> Option<CellEvent> {
    match method {
        "textDocument/didOpen" => parse_did_open(params),
        "textDocument/didClose" => parse_did_close(params),
        "textDocument/didChange" => parse_did_change(params),
        REFRESH_METHOD => parse_refresh(params),
        _ => None,
    }
}

fn position_to_value(position: Position) -> Value {
    json!({ "line": position.line, "character": position.character })
}

fn change_to_value(change: &ConcatChange) -> Value {
    json!({
        "range": {
            "start": position_to_value(change.range.start),
            "end": position_to_value(change.range.end),
        },
        "rangeOffset": change.range_offset,
        "rangeLength": change.range_length,
        "text": change.text,
    })
}

/// Serialize an outbound change event as a `didChange`-shaped payload.
pub fn concat_change_event_to_json(event: &ConcatChangeEvent) -> Value {
    json!({
        "textDocument": {
            "uri": event.uri,
            "version": event.version,
        },
        "contentChanges": event.changes.iter().map(change_to_value).collect::<Vec<_>>(),
    })
}
