//! Cross-file merging.
//!
//! Resolved documents are folded, strictly in caller order, into one
//! accumulated tree:
//!
//! - a path tagged `override` in the incoming document replaces the
//!   accumulated subtree wholesale;
//! - two mappings deep-merge key by key;
//! - everything else (two sequences, two scalars, mismatched shapes) is
//!   replaced by the incoming value, so the later file wins.
//!
//! Reset paths are only collected while folding. They are applied once, after
//! the last document, so a reset in file K also removes content that files
//! before K contributed.
//!
//! # Example
//!
//! ```
//! use yaml_overlay_core::{Mapping, Merger, Resolution, Value};
//!
//! fn doc(image: &str) -> Resolution {
//!     let mut map = Mapping::new();
//!     map.insert("image".into(), Value::from(image));
//!     Resolution { value: Some(Value::Mapping(map)), ..Resolution::default() }
//! }
//!
//! let mut merger = Merger::new();
//! merger.fold(doc("foo"));
//! merger.fold(doc("bar"));
//! let outcome = merger.finish();
//! assert_eq!(outcome.value.unwrap().get("image"), Some(&Value::from("bar")));
//! ```

use indexmap::map::Entry;
use tracing::debug;

use crate::error::Result;
use crate::node::Document;
use crate::path::{Path, PathSet};
use crate::reset::apply_resets;
use crate::resolve::{Resolution, Resolver};
use crate::value::Value;

/// Final result of a multi-document merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// The merged tree with resets applied; `None` if no document
    /// contributed anything.
    pub value: Option<Value>,
    /// Every reset path recorded across all documents.
    pub resets: PathSet,
}

/// Merges `incoming` into `acc` at `path`.
///
/// `overrides` holds the override paths recorded for the document `incoming`
/// came from.
pub fn merge_values(acc: Value, incoming: Value, path: &Path, overrides: &PathSet) -> Value {
    if overrides.contains(path) {
        debug!(path = %path, "Override replaces accumulated subtree");
        return incoming;
    }

    match (acc, incoming) {
        (Value::Mapping(mut acc_map), Value::Mapping(incoming_map)) => {
            for (key, value) in incoming_map {
                let child_path = path.key(key.as_str());
                match acc_map.entry(key) {
                    Entry::Occupied(mut slot) => {
                        let previous = std::mem::take(slot.get_mut());
                        *slot.get_mut() = merge_values(previous, value, &child_path, overrides);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
            Value::Mapping(acc_map)
        }
        (Value::Sequence(_), incoming @ Value::Sequence(_)) => incoming,
        (Value::Scalar(_), incoming @ Value::Scalar(_)) => incoming,
        (acc, incoming) => {
            debug!(
                path = %path,
                accumulated = acc.kind(),
                incoming = incoming.kind(),
                "Shape mismatch, later file wins"
            );
            incoming
        }
    }
}

/// Accumulates resolved documents in order.
#[derive(Debug, Default)]
pub struct Merger {
    accumulated: Option<Value>,
    resets: PathSet,
    documents: usize,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the next document into the accumulator.
    pub fn fold(&mut self, resolution: Resolution) {
        let Resolution {
            value,
            resets,
            overrides,
        } = resolution;

        self.documents += 1;
        self.resets.extend(resets);

        let Some(incoming) = value else {
            return;
        };
        self.accumulated = Some(match self.accumulated.take() {
            Some(acc) => merge_values(acc, incoming, &Path::root(), &overrides),
            None => incoming,
        });
    }

    /// Number of documents folded so far.
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn accumulated(&self) -> Option<&Value> {
        self.accumulated.as_ref()
    }

    /// Reset paths collected so far, not yet applied.
    pub fn resets(&self) -> &PathSet {
        &self.resets
    }

    /// Hands back the merged tree and the pending deletions without applying
    /// them.
    pub fn into_parts(self) -> (Option<Value>, PathSet) {
        (self.accumulated, self.resets)
    }

    /// Applies every collected reset and returns the final tree.
    pub fn finish(self) -> MergeOutcome {
        let documents = self.documents;
        let (mut value, resets) = self.into_parts();
        let removed = apply_resets(&mut value, &resets);
        debug!(documents, resets = resets.len(), removed, "Merge finished");
        MergeOutcome { value, resets }
    }
}

/// Resolves and merges `docs` in order with the default merge key.
///
/// # Errors
///
/// Returns the first [`MergeError::Cycle`](crate::MergeError::Cycle) raised
/// while resolving any document; nothing is merged in that case.
pub fn merge_documents(docs: &[Document]) -> Result<MergeOutcome> {
    merge_documents_with(&Resolver::new(), docs)
}

/// Like [`merge_documents`], with an explicit resolver configuration.
pub fn merge_documents_with(resolver: &Resolver, docs: &[Document]) -> Result<MergeOutcome> {
    let mut merger = Merger::new();
    for doc in docs {
        debug!(document = doc.name(), "Folding document");
        merger.fold(resolver.resolve(doc)?);
    }
    Ok(merger.finish())
}
