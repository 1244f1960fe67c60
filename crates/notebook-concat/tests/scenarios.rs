//! End-to-end scenarios for the concatenated document engine.

use notebook_concat::{
    CellContentChange, CellTextItem, ConcatDocument, ConcatError, HEADER_PRELUDE, Position, Range,
    SpanKind, TYPE_IGNORE_SUFFIX,
};

const CELL_W0: &str = "vscode-notebook-cell:/home/me/nb.ipynb#W0";
const CELL_W1: &str = "vscode-notebook-cell:/home/me/nb.ipynb#W1";

fn item(uri: &str, version: i32, text: &str) -> CellTextItem {
    CellTextItem {
        uri: uri.to_string(),
        version,
        text: text.to_string(),
    }
}

fn change(range: Range, text: &str) -> CellContentChange {
    CellContentChange {
        range: Some(range),
        text: text.to_string(),
    }
}

fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
    Range::new(Position::new(sl, sc), Position::new(el, ec))
}

#[test]
fn open_single_cell_emits_full_insertion() {
    let mut doc = ConcatDocument::new();
    let event = doc.open_cell(item(CELL_W0, 1, "print(1)\n"), false).unwrap();

    let kinds: Vec<SpanKind> = doc.spans().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SpanKind::Header, SpanKind::Real]);

    assert_eq!(event.changes.len(), 1);
    let change = &event.changes[0];
    assert_eq!(change.range, range(0, 0, 0, 0));
    assert_eq!(change.range_length, 0);
    assert_eq!(
        change.text,
        "import IPython\nIPython.get_ipython()\nprint(1)\n"
    );

    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.get_text(None), change.text);
    assert!(!doc.is_closed());
}

#[test]
fn directive_line_gets_suppression_span() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "!pip install x\nprint(1)\n"), false);

    let spans = doc.spans();
    assert_eq!(spans.len(), 4);
    assert_eq!(spans[1].kind, SpanKind::Real);
    assert_eq!(spans[1].text, "!pip install x");
    assert_eq!(spans[2].kind, SpanKind::TypeIgnore);
    assert_eq!(spans[2].text, TYPE_IGNORE_SUFFIX);
    assert_eq!(spans[3].kind, SpanKind::Real);
    assert_eq!(spans[3].text, "\nprint(1)\n");

    // The suppression span perturbs nothing in the real coordinate system.
    assert_eq!(doc.get_real_text(), "!pip install x\nprint(1)\n");

    // The cell's concat range covers the header, directive, and code lines.
    assert_eq!(doc.concat_range_of(CELL_W0), range(0, 0, 3, 9));
}

#[test]
fn edit_preserving_span_structure_is_partial() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "!pip install x\nprint(1)\n"), false);

    let event = doc
        .change_cell(CELL_W0, &[change(range(0, 0, 0, 14), "!pip install y")])
        .unwrap();

    assert_eq!(event.changes.len(), 1);
    let emitted = &event.changes[0];
    // Partial edit, not a whole-cell replacement.
    assert_eq!(emitted.range, range(2, 0, 2, 14));
    assert_eq!(emitted.text, "!pip install y");
    assert_eq!(emitted.range_offset, HEADER_PRELUDE.chars().count());
    assert_eq!(emitted.range_length, 14);

    assert_eq!(doc.get_real_text(), "!pip install y\nprint(1)\n");
}

#[test]
fn edit_changing_span_structure_replaces_whole_cell() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "!pip install x\nprint(1)\n"), false);

    let event = doc
        .change_cell(CELL_W0, &[change(range(0, 0, 0, 14), "print(2)")])
        .unwrap();

    // The directive disappeared, so the run shrank and the event spans all
    // old cell lines with the full new concat text.
    let emitted = &event.changes[0];
    assert_eq!(emitted.range, range(0, 0, 3, 9));
    assert_eq!(emitted.range_offset, 0);
    assert_eq!(
        emitted.text,
        format!("{}print(2)\nprint(1)\n", HEADER_PRELUDE)
    );

    let kinds: Vec<SpanKind> = doc.spans().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SpanKind::Header, SpanKind::Real]);
    assert_eq!(doc.get_real_text(), "print(2)\nprint(1)\n");
}

#[test]
fn close_only_cell_empties_document() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "print(1)\n"), false);
    let event = doc.close_cell(CELL_W0).unwrap();

    let emitted = &event.changes[0];
    assert_eq!(emitted.range.start, Position::new(0, 0));
    assert_eq!(emitted.range_offset, 0);
    assert_eq!(emitted.range_length, 46); // header (37) + "print(1)\n" (9)
    assert_eq!(emitted.text, "");

    assert!(doc.is_closed());
    assert_eq!(doc.line_count(), 0);
    assert_eq!(doc.get_text(None), "");
}

#[test]
fn refresh_reorders_cells() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W1, 1, "b = 2"), true);
    doc.open_cell(item(CELL_W0, 1, "a = 1"), true);
    assert_eq!(doc.get_real_text(), "b = 2\na = 1\n");

    let event = doc
        .refresh_cells(vec![item(CELL_W0, 2, "a = 1"), item(CELL_W1, 2, "b = 2")])
        .unwrap();

    let emitted = &event.changes[0];
    assert_eq!(emitted.range, range(0, 0, 3, 6));
    assert_eq!(emitted.range_length, 49);
    assert_eq!(emitted.text, doc.get_text(None));

    // Spans now follow the refreshed order, header first.
    let owners: Vec<(&str, SpanKind)> = doc
        .spans()
        .iter()
        .map(|s| (s.cell_uri.as_str(), s.kind))
        .collect();
    assert_eq!(
        owners,
        vec![
            (CELL_W0, SpanKind::Header),
            (CELL_W0, SpanKind::Real),
            (CELL_W1, SpanKind::Real),
        ]
    );
    assert_eq!(doc.get_real_text(), "a = 1\nb = 2\n");
}

#[test]
fn closing_first_cell_keeps_header_for_the_next() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "a = 1\n"), false);
    doc.open_cell(item(CELL_W1, 1, "b = 2\n"), false);

    let event = doc.close_cell(CELL_W0).unwrap();

    // The deletion starts after the (re-owned) header lines.
    let emitted = &event.changes[0];
    assert_eq!(emitted.range.start, Position::new(2, 0));
    assert_eq!(emitted.range_offset, 37);
    assert_eq!(emitted.range_length, 6);

    let spans = doc.spans();
    assert_eq!(spans[0].kind, SpanKind::Header);
    assert_eq!(spans[0].cell_uri, CELL_W1);
    assert_eq!(spans[0].concat_start, 0);

    // Real offsets of the surviving cell shifted down with the concat side.
    let real_span = spans.iter().find(|s| s.is_real()).unwrap();
    assert_eq!(real_span.real_start, 0);
    assert_eq!(doc.get_real_text(), "b = 2\n");
    assert_eq!(doc.get_text(None), format!("{}b = 2\n", HEADER_PRELUDE));
}

#[test]
fn ranged_get_text_returns_exact_substring() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "abc\ndef\nghi\n"), false);

    // Lines 2..4 are the cell's first two lines.
    assert_eq!(doc.get_text(Some(range(2, 1, 3, 2))), "bc\nde");
    assert_eq!(doc.get_text(Some(range(0, 0, 0, 6))), "import");
    // Degenerate range.
    assert_eq!(doc.get_text(Some(range(3, 1, 3, 1))), "");
}

#[test]
fn generic_offset_lookups_fail_loudly() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "a = 1\n"), false);

    assert!(matches!(
        doc.offset_at(Position::new(0, 0)),
        Err(ConcatError::AmbiguousCoordinateLookup)
    ));
    assert!(matches!(
        doc.position_at(0),
        Err(ConcatError::AmbiguousCoordinateLookup)
    ));
}

#[test]
fn word_query_converts_scanner_columns() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "value = compute(value)\n"), false);

    // "compute" on the cell's first line (concat line 2).
    let word = doc
        .word_range_at_position(Position::new(2, 10), None)
        .unwrap();
    assert_eq!(word, range(2, 8, 2, 15));

    // A pattern matching the empty string falls back to the default.
    let word = doc
        .word_range_at_position(Position::new(2, 10), Some(r"x*"))
        .unwrap();
    assert_eq!(word, range(2, 8, 2, 15));
}

#[test]
fn facade_metadata() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "a = 1\n"), false);

    assert!(!doc.save());
    assert!(doc.is_dirty());
    assert!(doc.is_untitled());
    assert_eq!(doc.language_id(), "python");
    assert_eq!(doc.eol(), notebook_concat::LineEnding::Lf);
    assert_eq!(doc.cells(), vec![CELL_W0.to_string()]);

    let identity = doc.identity().unwrap();
    assert!(identity.concat_uri.contains("_NotebookConcat_"));
    assert_eq!(identity.notebook_uri, "file:///home/me/nb.ipynb");
}

#[test]
fn real_range_excludes_header_lines() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "a = 1\nb = 2\n"), false);

    assert_eq!(doc.concat_range_of(CELL_W0), range(0, 0, 3, 6));
    assert_eq!(doc.real_range_of(CELL_W0), range(2, 0, 3, 6));
}

#[test]
fn multiple_changes_apply_sequentially() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "aaa\nbbb\n"), false);

    let event = doc
        .change_cell(
            CELL_W0,
            &[
                change(range(0, 0, 0, 3), "xxx"),
                change(range(1, 0, 1, 3), "yyy"),
            ],
        )
        .unwrap();

    assert_eq!(event.changes.len(), 2);
    assert_eq!(doc.get_real_text(), "xxx\nyyy\n");
    assert_eq!(event.changes[0].text, "xxx");
    assert_eq!(event.changes[1].text, "yyy");
    assert_eq!(event.changes[1].range, range(3, 0, 3, 3));
}

#[test]
fn change_without_range_inserts_at_beginning() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "b\n"), false);

    let event = doc
        .change_cell(
            CELL_W0,
            &[CellContentChange {
                range: None,
                text: "a\n".to_string(),
            }],
        )
        .unwrap();

    assert_eq!(doc.get_real_text(), "a\nb\n");
    assert_eq!(event.changes[0].range.start, Position::new(2, 0));
}

#[test]
fn out_of_range_change_is_skipped_not_fatal() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item(CELL_W0, 1, "a\n"), false);
    let before = doc.get_text(None);

    let event = doc
        .change_cell(
            CELL_W0,
            &[
                change(range(20, 0, 20, 1), "nope"),
                change(range(0, 0, 0, 1), "b"),
            ],
        )
        .unwrap();

    // The bad change is dropped, the good one still applies.
    assert_eq!(event.changes.len(), 1);
    assert_eq!(doc.get_real_text(), "b\n");
    assert_ne!(doc.get_text(None), before);
}

#[test]
fn refresh_is_ignored_for_interactive_documents() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item("vscode-interactive-input:/Input-1", 1, "x = 1\n"), false);

    assert!(doc
        .refresh_cells(vec![item(CELL_W0, 1, "a = 1")])
        .is_none());
    assert_eq!(doc.get_real_text(), "x = 1\n");
}

#[test]
fn input_cell_carries_no_header() {
    let mut doc = ConcatDocument::new();
    doc.open_cell(item("vscode-interactive-input:/Input-1", 1, "x = 1\n"), false);

    assert_eq!(doc.spans().len(), 1);
    assert_eq!(doc.spans()[0].kind, SpanKind::Real);
    assert_eq!(doc.get_text(None), "x = 1\n");
    assert_eq!(doc.line_count(), 1);
}
