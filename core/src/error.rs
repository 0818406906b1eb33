//! Error types for document resolution and merging.
//!
//! Merging is a pure transformation: the only fatal condition is a reference
//! cycle met while expanding aliases or merge keys. Kind mismatches between
//! files are resolved by last-file-wins and never surface here.

use thiserror::Error;

/// Errors raised while resolving or merging documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// An alias or merge key re-entered an anchor that is still being
    /// expanded. `path` is the rendered address where the back-edge was met.
    #[error("cycle detected at path: {path}")]
    Cycle { path: String },
}

/// A rendered path string that could not be parsed back into a
/// [`Path`](crate::Path).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path {input:?}: {reason}")]
pub struct PathParseError {
    pub input: String,
    pub reason: String,
}

/// Convenience alias for results with [`MergeError`].
pub type Result<T> = std::result::Result<T, MergeError>;
