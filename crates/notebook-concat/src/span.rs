//! Span model: the ordered list of substrings composing the concatenated
//! document.
//!
//! Every span belongs to exactly one cell and carries two parallel half-open
//! ranges: its extent in the concatenated text and its extent in the real
//! (cell-authored) text. Synthetic spans occupy zero real extent and anchor
//! to a single real offset.

/// What a span's text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Cell-authored text.
    Real,
    /// The synthetic header prelude at the top of the document.
    Header,
    /// A synthetic type-suppression suffix appended to a directive line.
    TypeIgnore,
}

/// A contiguous substring of the concatenated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Owning cell URI.
    pub cell_uri: String,
    /// Ordering key derived from the cell URI (−1 for the input cell).
    pub fragment: i64,
    /// Span kind.
    pub kind: SpanKind,
    /// Start offset in the concatenated text (inclusive, `char`s).
    pub concat_start: usize,
    /// End offset in the concatenated text (exclusive, `char`s).
    pub concat_end: usize,
    /// Start offset in the real text (inclusive, `char`s).
    pub real_start: usize,
    /// End offset in the real text (exclusive; equals `real_start` for
    /// synthetic spans).
    pub real_end: usize,
    /// Contribution to the concatenated text.
    pub text: String,
    /// Contribution to the real text (empty for synthetic spans).
    pub real_text: String,
}

impl Span {
    /// Returns `true` if the span's text is cell-authored.
    pub fn is_real(&self) -> bool {
        self.kind == SpanKind::Real
    }

    /// Length of `text` in characters.
    pub fn concat_len(&self) -> usize {
        self.concat_end - self.concat_start
    }

    /// Length of `real_text` in characters.
    pub fn real_len(&self) -> usize {
        self.real_end - self.real_start
    }
}

/// Ordered span storage.
///
/// Spans are kept sorted by `concat_start` and contiguous; all spans of one
/// cell occupy a single run of indexes. The engine is the only mutator.
#[derive(Debug, Clone, Default)]
pub struct SpanList {
    spans: Vec<Span>,
}

impl SpanList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns `true` if no spans are stored.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Iterate spans in concat order.
    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// The spans as a slice.
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Span at `index`.
    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    /// Index of the first span owned by `cell_uri`.
    pub fn first_index_of(&self, cell_uri: &str) -> Option<usize> {
        self.spans.iter().position(|s| s.cell_uri == cell_uri)
    }

    /// Index of the last span owned by `cell_uri`.
    pub fn last_index_of(&self, cell_uri: &str) -> Option<usize> {
        self.spans.iter().rposition(|s| s.cell_uri == cell_uri)
    }

    /// Contiguous index range of the spans owned by `cell_uri`.
    pub fn run_of(&self, cell_uri: &str) -> Option<std::ops::Range<usize>> {
        let first = self.first_index_of(cell_uri)?;
        let last = self.last_index_of(cell_uri)?;
        Some(first..last + 1)
    }

    /// Returns `true` if any span belongs to `cell_uri`.
    pub fn contains_cell(&self, cell_uri: &str) -> bool {
        self.first_index_of(cell_uri).is_some()
    }

    /// Cell URIs in encounter order, deduplicated.
    pub fn cells(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for span in &self.spans {
            if out.last().map(String::as_str) != Some(span.cell_uri.as_str())
                && !out.iter().any(|c| c == &span.cell_uri)
            {
                out.push(span.cell_uri.clone());
            }
        }
        out
    }

    /// Total length of the concatenated text in characters.
    pub fn concat_len(&self) -> usize {
        self.spans.last().map(|s| s.concat_end).unwrap_or(0)
    }

    /// Total length of the real text in characters.
    pub fn real_len(&self) -> usize {
        self.spans.last().map(|s| s.real_end).unwrap_or(0)
    }

    /// Join all span texts into the concatenated text.
    pub fn concat_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Join all real texts into the real text.
    pub fn real_text(&self) -> String {
        self.spans.iter().map(|s| s.real_text.as_str()).collect()
    }

    /// The real span containing `real_offset` (half-open).
    pub fn real_span_at(&self, real_offset: usize) -> Option<&Span> {
        self.spans
            .iter()
            .find(|s| s.is_real() && s.real_start <= real_offset && real_offset < s.real_end)
    }

    /// The span (real or synthetic) containing `concat_offset` (half-open).
    pub fn span_at(&self, concat_offset: usize) -> Option<&Span> {
        self.spans
            .iter()
            .find(|s| s.concat_start <= concat_offset && concat_offset < s.concat_end)
    }

    /// Shift the concat/real offsets of every span at `index` and beyond.
    pub(crate) fn shift_from(&mut self, index: usize, concat_delta: isize, real_delta: isize) {
        for span in self.spans.iter_mut().skip(index) {
            span.concat_start = span.concat_start.saturating_add_signed(concat_delta);
            span.concat_end = span.concat_end.saturating_add_signed(concat_delta);
            span.real_start = span.real_start.saturating_add_signed(real_delta);
            span.real_end = span.real_end.saturating_add_signed(real_delta);
        }
    }

    /// Insert `spans` at `index`.
    pub(crate) fn insert_at(&mut self, index: usize, spans: Vec<Span>) {
        self.spans.splice(index..index, spans);
    }

    /// Replace the span run `range` with `spans`, returning the old run.
    pub(crate) fn splice_run(
        &mut self,
        range: std::ops::Range<usize>,
        spans: Vec<Span>,
    ) -> Vec<Span> {
        self.spans.splice(range, spans).collect()
    }

    /// Remove and return the span run `range`.
    pub(crate) fn remove_run(&mut self, range: std::ops::Range<usize>) -> Vec<Span> {
        self.spans.drain(range).collect()
    }

    /// Remove every span.
    pub(crate) fn clear(&mut self) {
        self.spans.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(cell: &str, concat_start: usize, real_start: usize, text: &str) -> Span {
        let len = text.chars().count();
        Span {
            cell_uri: cell.to_string(),
            fragment: 0,
            kind: SpanKind::Real,
            concat_start,
            concat_end: concat_start + len,
            real_start,
            real_end: real_start + len,
            text: text.to_string(),
            real_text: text.to_string(),
        }
    }

    #[test]
    fn test_run_lookup() {
        let mut list = SpanList::new();
        list.insert_at(0, vec![real("a", 0, 0, "x\n"), real("b", 2, 2, "y\n")]);
        assert_eq!(list.run_of("a"), Some(0..1));
        assert_eq!(list.run_of("b"), Some(1..2));
        assert_eq!(list.run_of("c"), None);
        assert_eq!(list.cells(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_shift_from() {
        let mut list = SpanList::new();
        list.insert_at(0, vec![real("a", 0, 0, "x\n"), real("b", 2, 2, "y\n")]);
        list.shift_from(1, 3, 1);
        let b = list.get(1).unwrap();
        assert_eq!((b.concat_start, b.concat_end), (5, 7));
        assert_eq!((b.real_start, b.real_end), (3, 5));
    }

    #[test]
    fn test_span_lookup_by_offset() {
        let mut list = SpanList::new();
        list.insert_at(0, vec![real("a", 0, 0, "x\n"), real("b", 2, 2, "y\n")]);
        assert_eq!(list.span_at(1).unwrap().cell_uri, "a");
        assert_eq!(list.span_at(2).unwrap().cell_uri, "b");
        assert!(list.span_at(4).is_none());
        assert_eq!(list.real_span_at(3).unwrap().cell_uri, "b");
    }
}
