//! Structural paths and the path builder.
//!
//! Paths follow the restricted JSONPath-like grammar used by Pact matching
//! rules and generators:
//!
//! - `.key` addresses a mapping member (`['key']` when the key is not a
//!   plain identifier)
//! - `[index]` addresses a sequence element
//! - `[*]` / `[*].*` are wildcards pre-applied when entering a repetition
//!   matcher's collection
//!
//! Bodies are rooted at `$`. Request paths, headers and query parameters are
//! rooted at the empty string, where JSONPath addressing is not meaningful.

use std::fmt;

use serde::Serialize;

/// A structural address inside a compiled value tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Path(String);

impl Path {
    /// Root path for body contexts.
    pub fn body_root() -> Self {
        Path("$".to_string())
    }

    /// Root path for path, header and query contexts.
    pub fn empty() -> Self {
        Path(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of wildcard segments (`[*]`) in this path.
    pub fn wildcard_count(&self) -> usize {
        self.0.matches("[*]").count()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Path(value.to_string())
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        Path(value)
    }
}

/// A child position within a mapping or a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Shape of the collection a repetition matcher wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    Sequence,
    Mapping,
}

/// Produce the path of a child node.
///
/// Every element of a repeated collection shares its parent's path, so an
/// index under `inside_repetition` leaves the path unchanged. Keys under an
/// empty parent are emitted as they are. Other keys containing anything
/// besides ASCII letters, digits, `_` and `-` are bracket-quoted, so
/// `"user.name"` can not collide with `user` / `name`.
pub fn extend(parent: &Path, segment: Segment<'_>, inside_repetition: bool) -> Path {
    match segment {
        Segment::Key(key) if parent.is_empty() => Path(key.to_string()),
        Segment::Key(key) if is_plain_key(key) => Path(format!("{}.{key}", parent.0)),
        Segment::Key(key) => Path(format!("{}['{}']", parent.0, key.replace('\'', "\\'"))),
        Segment::Index(_) if inside_repetition => parent.clone(),
        Segment::Index(index) => Path(format!("{}[{index}]", parent.0)),
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Path used for the contents of a repetition matcher.
///
/// Exactly one wildcard level is applied per repetition.
pub fn wildcard(parent: &Path, shape: CollectionShape) -> Path {
    match shape {
        CollectionShape::Sequence => Path(format!("{}[*]", parent.0)),
        CollectionShape::Mapping => Path(format!("{}[*].*", parent.0)),
    }
}
