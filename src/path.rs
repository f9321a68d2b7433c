//! Rendered hierarchical position within the target structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dotted/bracketed path to a field, key, or index, built incrementally as
/// the decoder descends: `items[2].name`. The empty path is the document
/// root and renders as `$`.
///
/// Once attached to an error the path is an opaque rendered string; nothing
/// mutates it after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(String);

impl Path {
    pub fn root() -> Self {
        Path(String::new())
    }

    /// Extends with a field name or mapping key.
    pub fn child(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Path(key.to_string())
        } else {
            Path(format!("{}.{}", self.0, key))
        }
    }

    /// Extends with a sequence index.
    pub fn index(&self, i: usize) -> Self {
        Path(format!("{}[{}]", self.0, i))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw rendered form; empty at the root.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("$")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Path(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Path;

    #[test]
    fn composes_fields_and_indexes() {
        let path = Path::root().child("items").index(2).child("name");
        assert_eq!(path.as_str(), "items[2].name");
        assert_eq!(path.to_string(), "items[2].name");
    }

    #[test]
    fn root_renders_distinctly() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.as_str(), "");
        assert_eq!(root.to_string(), "$");
    }

    #[test]
    fn index_at_root_has_no_leading_dot() {
        assert_eq!(Path::root().index(0).as_str(), "[0]");
        assert_eq!(Path::root().child("a").as_str(), "a");
    }
}
