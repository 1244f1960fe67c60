//! Stable synthetic identifiers for the concatenated document.
//!
//! Derived once from the first observed cell and kept until a refresh clears
//! the state. The concat URI must be stable across sessions for the same
//! notebook path, hence the content-independent path hash.

use crate::cell_uri::{CellUri, INTERACTIVE_SCHEME, UNTITLED_SCHEME, percent_encode};
use sha1::{Digest, Sha1};

/// Identity of a concatenated document and its owning notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatIdentity {
    /// URI of the synthetic concatenated document.
    pub concat_uri: String,
    /// URI of the notebook the cells belong to.
    pub notebook_uri: String,
    /// Whether the identity was derived from an interactive input cell.
    pub interactive: bool,
}

impl ConcatIdentity {
    /// Derive the identity from the first observed cell.
    pub fn derive(cell: &CellUri) -> Self {
        let hash = short_path_hash(cell.path());
        let dir = cell.dir_path();
        let concat_path = if dir.is_empty() || dir == "/" {
            format!("/_NotebookConcat_{}.py", hash)
        } else {
            format!("{}/_NotebookConcat_{}.py", dir, hash)
        };
        let concat_uri = format!("file://{}", percent_encode(&concat_path));

        let interactive = cell.is_interactive_input();
        let notebook_uri = if interactive {
            cell.reformat(INTERACTIVE_SCHEME, true, false)
        } else if cell.fragment().contains("untitled") {
            cell.reformat(UNTITLED_SCHEME, false, false)
        } else {
            format!("file://{}", percent_encode(cell.path()))
        };

        Self {
            concat_uri,
            notebook_uri,
            interactive,
        }
    }
}

/// Truncated 12-hex-character SHA-1 of a filesystem path.
fn short_path_hash(path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(path.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(12);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_short() {
        let a = short_path_hash("/home/me/nb.ipynb");
        let b = short_path_hash("/home/me/nb.ipynb");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, short_path_hash("/home/me/other.ipynb"));
    }

    #[test]
    fn test_file_notebook_identity() {
        let cell = CellUri::parse("vscode-notebook-cell:/home/me/nb.ipynb#W0");
        let id = ConcatIdentity::derive(&cell);
        assert!(id.concat_uri.starts_with("file:///home/me/_NotebookConcat_"));
        assert!(id.concat_uri.ends_with(".py"));
        assert_eq!(id.notebook_uri, "file:///home/me/nb.ipynb");
        assert!(!id.interactive);
    }

    #[test]
    fn test_interactive_identity() {
        let cell = CellUri::parse("vscode-interactive-input:/InteractiveInput-1#abc");
        let id = ConcatIdentity::derive(&cell);
        assert!(id.interactive);
        assert_eq!(id.notebook_uri, "vscode-interactive:/InteractiveInput-1");
    }

    #[test]
    fn test_untitled_identity() {
        let cell = CellUri::parse("vscode-notebook-cell:/Untitled-1.ipynb?x=1#untitled0");
        let id = ConcatIdentity::derive(&cell);
        assert_eq!(id.notebook_uri, "untitled:/Untitled-1.ipynb");
    }
}
