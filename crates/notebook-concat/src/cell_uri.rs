//! Cell identifier parsing.
//!
//! Cell URIs look like `vscode-notebook-cell:/path/to/nb.ipynb#W2`. This
//! module keeps the parsing self-contained and total: missing components come
//! back as empty strings, and the ordering key falls back to `0` when the
//! fragment carries no digits.

/// Scheme used by ordinary notebook cells.
pub const NOTEBOOK_CELL_SCHEME: &str = "vscode-notebook-cell";

/// Scheme used by the interactive window's input box.
pub const INTERACTIVE_INPUT_SCHEME: &str = "vscode-interactive-input";

/// Scheme of an interactive window document.
pub const INTERACTIVE_SCHEME: &str = "vscode-interactive";

/// Scheme used for unsaved notebooks.
pub const UNTITLED_SCHEME: &str = "untitled";

/// Ordering key reserved for the interactive input cell. Sorts after every
/// notebook cell.
pub const INPUT_CELL_FRAGMENT: i64 = -1;

/// A parsed cell identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUri {
    raw: String,
    scheme: String,
    authority: String,
    path: String,
    query: String,
    fragment: String,
}

impl CellUri {
    /// Parse a cell URI. Never fails; components that are absent parse as
    /// empty strings and the whole input is kept as the raw form.
    pub fn parse(raw: &str) -> Self {
        let mut rest = raw;

        let scheme = match rest.find(':') {
            Some(idx) if rest[..idx].chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') => {
                let s = &rest[..idx];
                rest = &rest[idx + 1..];
                s.to_string()
            }
            _ => String::new(),
        };

        let authority = if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            rest = &after[end..];
            after[..end].to_string()
        } else {
            String::new()
        };

        let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
        let path = percent_decode(&rest[..path_end]);
        rest = &rest[path_end..];

        let query = if let Some(after) = rest.strip_prefix('?') {
            let end = after.find('#').unwrap_or(after.len());
            rest = &after[end..];
            after[..end].to_string()
        } else {
            String::new()
        };

        let fragment = rest.strip_prefix('#').unwrap_or("").to_string();

        Self {
            raw: raw.to_string(),
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    /// The original URI string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// URI scheme (empty if the input had none).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Percent-decoded path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query component (without the `?`).
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fragment component (without the `#`).
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Returns `true` for the interactive window's input cell.
    pub fn is_interactive_input(&self) -> bool {
        self.scheme == INTERACTIVE_INPUT_SCHEME
    }

    /// Integer ordering key for this cell.
    ///
    /// The input cell sorts last and gets the reserved key
    /// [`INPUT_CELL_FRAGMENT`]. For notebook cells the key is the numeric
    /// tail of the fragment (`"W2"` -> `2`), defaulting to `0`.
    pub fn fragment_index(&self) -> i64 {
        if self.is_interactive_input() {
            return INPUT_CELL_FRAGMENT;
        }
        let digits = self
            .fragment
            .trim_start_matches(|c: char| !c.is_ascii_digit());
        digits.parse().unwrap_or(0)
    }

    /// Directory part of the path (everything up to the final separator).
    pub fn dir_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) => "/",
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    /// Rebuild this URI with a different scheme, optionally dropping the
    /// query and/or fragment.
    pub fn reformat(&self, scheme: &str, keep_query: bool, keep_fragment: bool) -> String {
        let mut out = String::new();
        out.push_str(scheme);
        out.push(':');
        if !self.authority.is_empty() {
            out.push_str("//");
            out.push_str(&self.authority);
        }
        out.push_str(&percent_encode(&self.path));
        if keep_query && !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if keep_fragment && !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }
}

/// Percent-encode a path for use inside a URI. Keeps URI-safe bytes and
/// path separators.
pub fn percent_encode(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for &b in path.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Percent-decode a URI path component. Invalid escapes pass through
/// unchanged.
pub fn percent_decode(path: &str) -> String {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = path.as_bytes();
    let mut out = Vec::<u8>::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2]))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).to_string()
}
