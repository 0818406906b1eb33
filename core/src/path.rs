//! Canonical node addresses.
//!
//! A [`Path`] names a node inside a document tree as a sequence of mapping
//! keys and sequence indices. Paths are recorded while resolving directives
//! and later compared exactly (never as prefixes or wildcards) when the merge
//! engine and reset applier walk the accumulated tree.
//!
//! # Rendering
//!
//! Key segments are joined with `.`, index segments are bracketed:
//!
//! ```
//! use yaml_overlay_core::Path;
//!
//! let path = Path::root().key("services").key("web").key("ports").index(2);
//! assert_eq!(path.to_string(), "services.web.ports[2]");
//!
//! let parsed: Path = "services.web.ports[2]".parse().unwrap();
//! assert_eq!(parsed, path);
//! ```
//!
//! Keys that would make the rendering ambiguous (containing `.`, `[`, `]`,
//! `"`, or empty) are written as a quoted bracket segment, e.g.
//! `labels["com.example.role"]`, so two paths render equally exactly when
//! their segments are equal.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathParseError;

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:(\.)?([^.\[\]"]+)|\[(\d+)\]|\[("(?:[^"\\]|\\.)*")\])"#)
        .expect("static regex must compile")
});

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A mapping key.
    Key(String),
    /// A position inside a sequence.
    Index(usize),
}

impl Segment {
    fn needs_quoting(key: &str) -> bool {
        key.is_empty() || key.contains(['.', '[', ']', '"'])
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Hierarchical address of a node, from the document root.
///
/// Paths are immutable values: [`descend`](Self::descend) and its shorthands
/// return a new path and leave the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The address of the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Alias of [`root`](Self::root).
    pub fn empty() -> Self {
        Self::root()
    }

    /// Returns a new path with `segment` appended.
    pub fn descend(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new path descending into mapping key `key`.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.descend(Segment::Key(key.into()))
    }

    /// Returns a new path descending into sequence position `index`.
    pub fn index(&self, index: usize) -> Self {
        self.descend(Segment::Index(index))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if this path addresses a sequence element.
    pub fn is_index(&self) -> bool {
        matches!(self.last(), Some(Segment::Index(_)))
    }

    /// Exact comparison against a recorded pattern path.
    pub fn matches(&self, pattern: &Path) -> bool {
        self == pattern
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if Segment::needs_quoting(key) => {
                    let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                    write!(f, "[{quoted}]")?;
                }
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = |reason: String| PathParseError {
            input: input.to_string(),
            reason,
        };

        let mut path = Path::root();
        let mut rest = input;
        while !rest.is_empty() {
            let caps = SEGMENT_RE
                .captures(rest)
                .ok_or_else(|| error(format!("unexpected input at {rest:?}")))?;

            if let Some(key) = caps.get(2) {
                let dotted = caps.get(1).is_some();
                if dotted == path.is_root() {
                    return Err(error(format!("misplaced separator before {:?}", key.as_str())));
                }
                path = path.key(key.as_str());
            } else if let Some(index) = caps.get(3) {
                let index = index
                    .as_str()
                    .parse::<usize>()
                    .map_err(|e| error(e.to_string()))?;
                path = path.index(index);
            } else if let Some(quoted) = caps.get(4) {
                let key: String =
                    serde_json::from_str(quoted.as_str()).map_err(|e| error(e.to_string()))?;
                path = path.key(key);
            }

            let consumed = caps.get(0).map_or(0, |m| m.end());
            rest = &rest[consumed..];
        }
        Ok(path)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered set of recorded paths (reset tombstones or override markers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet {
    paths: BTreeSet<Path>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path`; returns `false` if it was already present.
    pub fn insert(&mut self, path: Path) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }
}

impl Extend<Path> for PathSet {
    fn extend<I: IntoIterator<Item = Path>>(&mut self, iter: I) {
        self.paths.extend(iter);
    }
}

impl FromIterator<Path> for PathSet {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PathSet {
    type Item = Path;
    type IntoIter = std::collections::btree_set::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_renders_empty() {
        assert_eq!(Path::root().to_string(), "");
        assert!(Path::empty().is_root());
    }

    #[test]
    fn test_render_mixed_segments() {
        let path = Path::root().key("a").key("b").index(2).key("c");
        assert_eq!(path.to_string(), "a.b[2].c");
    }

    #[test]
    fn test_render_leading_index() {
        let path = Path::root().index(0).key("name");
        assert_eq!(path.to_string(), "[0].name");
    }

    #[test]
    fn test_descend_does_not_mutate_parent() {
        let parent = Path::root().key("services");
        let child = parent.key("web");
        assert_eq!(parent.to_string(), "services");
        assert_eq!(child.to_string(), "services.web");
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn test_key_index_distinct() {
        let by_key = Path::root().key("ports").key("0");
        let by_index = Path::root().key("ports").index(0);
        assert_ne!(by_key, by_index);
        assert_ne!(by_key.to_string(), by_index.to_string());
    }

    #[test]
    fn test_dotted_key_is_quoted() {
        let path = Path::root().key("labels").key("com.example.role");
        assert_eq!(path.to_string(), r#"labels["com.example.role"]"#);
        assert_ne!(path, Path::root().key("labels").key("com").key("example").key("role"));
    }

    #[test]
    fn test_parse_inverts_render() {
        for raw in [
            "x-healthcheck.egress-service",
            "services.app.volumes[1]",
            r#"labels["com.example.role"].value"#,
            "[3][4].deep",
            r#"[""]"#,
        ] {
            let path: Path = raw.parse().unwrap();
            assert_eq!(path.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(".a".parse::<Path>().is_err());
        assert!("a[0]b".parse::<Path>().is_err());
        assert!("a[x]".parse::<Path>().is_err());
        assert!("a..b".parse::<Path>().is_err());
    }

    #[test]
    fn test_matches_is_exact() {
        let pattern = Path::root().key("networks").key("test");
        assert!(Path::root().key("networks").key("test").matches(&pattern));
        assert!(!Path::root().key("networks").matches(&pattern));
        assert!(!pattern.key("name").matches(&pattern));
    }

    #[test]
    fn test_path_set_serializes_as_strings() {
        let set: PathSet = [Path::root().key("b"), Path::root().key("a").index(1)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["a[1]","b"]"#);

        let back: PathSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
