//! Word-boundary scanning for "word at position" queries.
//!
//! The scanner works on a single line of text and reports match columns
//! 1-based; the document facade converts to 0-based at the boundary.

use regex::Regex;
use tracing::warn;

/// Default word pattern: decimal numbers, or runs of characters that are not
/// separators/whitespace.
pub const DEFAULT_WORD_PATTERN: &str =
    r#"(-?\d*\.\d\w*)|([^\s`~!@#$%^&*()\-=+\[{\]}\\|;:'",.<>/?]+)"#;

fn default_regex() -> Regex {
    Regex::new(DEFAULT_WORD_PATTERN).expect("default word pattern is valid")
}

/// Compile a caller-supplied word pattern, substituting the default when the
/// pattern is absent, invalid, or able to match the empty string (an
/// empty-matching pattern would loop forever on scan).
pub fn validated_word_regex(pattern: Option<&str>) -> Regex {
    match pattern {
        None => default_regex(),
        Some(pat) => match Regex::new(pat) {
            Ok(re) if !re.is_match("") => re,
            Ok(_) => {
                warn!(pattern = pat, "word pattern matches the empty string; using default");
                default_regex()
            }
            Err(err) => {
                warn!(pattern = pat, error = %err, "invalid word pattern; using default");
                default_regex()
            }
        },
    }
}

/// Find the word containing (or ending at) the 0-based `character` offset of
/// `line`. Returns 1-based start/end columns, end exclusive.
pub fn word_at(line: &str, character: usize, regex: &Regex) -> Option<(usize, usize)> {
    for m in regex.find_iter(line) {
        let start = line[..m.start()].chars().count();
        let end = start + line[m.start()..m.end()].chars().count();
        if start <= character && character <= end {
            return Some((start + 1, end + 1));
        }
        if start > character {
            break;
        }
    }
    None
}
