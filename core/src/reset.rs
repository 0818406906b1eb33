//! Tombstone deletion over the final merged tree.
//!
//! Matching is exact: an entry is removed when its own path is in the reset
//! set. Descendants of a removed entry go with it; a reset recorded deeper
//! than an existing entry does not cascade upward.

use tracing::debug;

use crate::path::{Path, PathSet};
use crate::value::Value;

/// Removes every mapping entry and sequence element whose path is in
/// `resets`, returning how many were removed.
///
/// Sequence elements are matched by their position before any removal, and
/// survivors are collected in order rather than re-indexed. A root path in
/// `resets` clears the whole tree.
///
/// A `reset` tag records the tagged node's current path. The resolver does so
/// for mapping values and the document root, but a tagged sequence element
/// is dropped from its own document without being recorded, since indices
/// shift between files. Index paths therefore only reach this function
/// through a [`PathSet`] the caller builds directly.
pub fn apply_resets(value: &mut Option<Value>, resets: &PathSet) -> usize {
    if resets.is_empty() {
        return 0;
    }
    if resets.contains(&Path::root()) {
        debug!("Reset at document root clears the merged tree");
        return usize::from(value.take().is_some());
    }
    match value {
        Some(tree) => prune(tree, &Path::root(), resets),
        None => 0,
    }
}

fn prune(value: &mut Value, path: &Path, resets: &PathSet) -> usize {
    let mut removed = 0;
    match value {
        Value::Mapping(map) => {
            map.retain(|key, child| {
                let child_path = path.key(key.as_str());
                if resets.contains(&child_path) {
                    debug!(path = %child_path, "Removing reset entry");
                    removed += 1;
                    return false;
                }
                removed += prune(child, &child_path, resets);
                true
            });
        }
        Value::Sequence(items) => {
            let survivors = std::mem::take(items)
                .into_iter()
                .enumerate()
                .filter_map(|(index, mut item)| {
                    let item_path = path.index(index);
                    if resets.contains(&item_path) {
                        debug!(path = %item_path, "Skipping reset element");
                        removed += 1;
                        return None;
                    }
                    removed += prune(&mut item, &item_path, resets);
                    Some(item)
                })
                .collect();
            *items = survivors;
        }
        Value::Scalar(_) => {}
    }
    removed
}
