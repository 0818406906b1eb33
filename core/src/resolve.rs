//! Single-document directive resolution.
//!
//! [`resolve`] walks one [`Document`] depth-first and builds a fresh,
//! directive-free [`Value`] tree. Along the way it:
//!
//! - expands aliases at the path where they are *used*, so directives and
//!   cycle checks apply at the point of reference;
//! - folds merge-key (`<<`) sources into the sibling fields of their mapping;
//! - flattens sequences that an alias spliced into another sequence;
//! - records `reset` paths (tombstones) and `override` paths (replace
//!   markers) for the cross-file merge.
//!
//! # Merge-key precedence
//!
//! When a merge source and a local field share a key, the merge source wins
//! for scalars. Two sequences are appended instead, skipping source elements
//! that are scalar-equal to a local element. Any other pairing (a mapping on
//! either side, or a scalar against a sequence) keeps the local field; nested
//! maps are only merged across files.
//!
//! ```
//! use yaml_overlay_core::{Document, Value, resolve};
//!
//! // base: &base { image: alpine }
//! // app:  { image: python, <<: *base }
//! let mut doc = Document::new("inline");
//! let alpine = doc.scalar("alpine");
//! let base = doc.mapping(vec![("image".into(), alpine)]);
//! doc.set_anchor(base, "base");
//! let python = doc.scalar("python");
//! let alias = doc.alias(base);
//! let app = doc.mapping(vec![("image".into(), python), ("<<".into(), alias)]);
//! let root = doc.mapping(vec![("base".into(), base), ("app".into(), app)]);
//! doc.set_root(root);
//!
//! let resolved = resolve(&doc).unwrap();
//! let value = resolved.value.unwrap();
//! assert_eq!(value.get("app").and_then(|app| app.get("image")), Some(&Value::from("alpine")));
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::map::Entry;
use tracing::debug;

use crate::cycle::CycleTracker;
use crate::error::{MergeError, Result};
use crate::node::{Directive, Document, NodeId, NodeKind};
use crate::path::{Path, PathSet};
use crate::value::{Mapping, Value};

/// Reserved mapping key whose value is folded into the enclosing mapping.
pub const DEFAULT_MERGE_KEY: &str = "<<";

/// Output of resolving one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Resolved tree, or `None` when the document is empty or its root was
    /// reset.
    pub value: Option<Value>,
    /// Paths tagged `reset`, to be deleted after every file is merged.
    pub resets: PathSet,
    /// Paths tagged `override`, replaced wholesale when this document is
    /// folded into the accumulator.
    pub overrides: PathSet,
}

/// Resolves `doc` with the default merge key.
pub fn resolve(doc: &Document) -> Result<Resolution> {
    Resolver::new().resolve(doc)
}

/// Directive resolver configuration.
#[derive(Debug, Clone)]
pub struct Resolver {
    merge_key: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            merge_key: DEFAULT_MERGE_KEY.to_string(),
        }
    }

    /// Uses `merge_key` instead of `<<` as the merge-key marker.
    pub fn with_merge_key(mut self, merge_key: impl Into<String>) -> Self {
        self.merge_key = merge_key.into();
        self
    }

    pub fn merge_key(&self) -> &str {
        &self.merge_key
    }

    /// Resolves one document into a directive-free tree plus its recorded
    /// reset and override paths.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Cycle`] when an alias or merge key re-enters an
    /// anchor that is still being expanded.
    pub fn resolve(&self, doc: &Document) -> Result<Resolution> {
        let Some(root) = doc.root() else {
            debug!(document = doc.name(), "Empty document");
            return Ok(Resolution::default());
        };

        let frames = AnchorIndex::build(doc, root, &self.merge_key)?;
        let mut pass = Pass {
            doc,
            merge_key: &self.merge_key,
            frames,
            resets: PathSet::new(),
            overrides: PathSet::new(),
        };
        let mut tracker = CycleTracker::new();
        let value = pass.resolve_node(&mut tracker, root, &Path::root())?;

        debug!(
            document = doc.name(),
            resets = pass.resets.len(),
            overrides = pass.overrides.len(),
            "Resolved document"
        );
        Ok(Resolution {
            value,
            resets: pass.resets,
            overrides: pass.overrides,
        })
    }
}

struct Pass<'a> {
    doc: &'a Document,
    merge_key: &'a str,
    /// Definition path of every anchored or aliased node.
    frames: HashMap<NodeId, Path>,
    resets: PathSet,
    overrides: PathSet,
}

impl Pass<'_> {
    fn frame_for(&mut self, id: NodeId, at: &Path) -> Path {
        self.frames.entry(id).or_insert_with(|| at.clone()).clone()
    }

    fn resolve_node(
        &mut self,
        tracker: &mut CycleTracker,
        id: NodeId,
        path: &Path,
    ) -> Result<Option<Value>> {
        let node = self.doc.node(id);
        if let NodeKind::Alias(target) = node.kind {
            if node.directive == Directive::Plain {
                return self.resolve_alias(tracker, target, path);
            }
        }

        match self.frames.get(&id).cloned() {
            Some(frame) => {
                tracker.guarded(&frame, path, |t| self.resolve_content(t, id, path))
            }
            None => self.resolve_content(tracker, id, path),
        }
    }

    fn resolve_alias(
        &mut self,
        tracker: &mut CycleTracker,
        target: NodeId,
        path: &Path,
    ) -> Result<Option<Value>> {
        let frame = self.frame_for(target, path);
        tracker.guarded(&frame, path, |t| match self.doc.node(target).kind {
            NodeKind::Alias(next) => self.resolve_alias(t, next, path),
            _ => self.resolve_content(t, target, path),
        })
    }

    fn resolve_content(
        &mut self,
        tracker: &mut CycleTracker,
        id: NodeId,
        path: &Path,
    ) -> Result<Option<Value>> {
        let doc = self.doc;
        let node = doc.node(id);

        match node.directive {
            Directive::Reset => {
                if path.is_index() {
                    debug!(path = %path, "Dropping reset sequence element");
                } else {
                    debug!(path = %path, "Recorded reset");
                    self.resets.insert(path.clone());
                }
                return Ok(None);
            }
            Directive::Override => {
                debug!(path = %path, "Recorded override");
                self.overrides.insert(path.clone());
            }
            Directive::Plain => {}
        }

        match &node.kind {
            NodeKind::Scalar(scalar) => Ok(Some(Value::Scalar(scalar.clone()))),
            NodeKind::Sequence(items) => self.resolve_sequence(tracker, items, path).map(Some),
            NodeKind::Mapping(entries) => self.resolve_mapping(tracker, entries, path).map(Some),
            NodeKind::Alias(target) => self.resolve_alias(tracker, *target, path),
        }
    }

    fn resolve_sequence(
        &mut self,
        tracker: &mut CycleTracker,
        items: &[NodeId],
        path: &Path,
    ) -> Result<Value> {
        let doc = self.doc;
        let mut out = Vec::with_capacity(items.len());

        for (index, &item) in items.iter().enumerate() {
            let item_path = path.index(index);
            let spliced = matches!(doc.node(item).kind, NodeKind::Alias(_));
            match self.resolve_node(tracker, item, &item_path)? {
                Some(Value::Sequence(nested)) if spliced => {
                    debug!(path = %item_path, items = nested.len(), "Flattening aliased sequence");
                    out.extend(nested);
                }
                Some(value) => out.push(value),
                None => {}
            }
        }

        Ok(Value::Sequence(out))
    }

    fn resolve_mapping(
        &mut self,
        tracker: &mut CycleTracker,
        entries: &[(String, NodeId)],
        path: &Path,
    ) -> Result<Value> {
        let mut fields = Mapping::with_capacity(entries.len());
        let mut sources = Vec::new();

        for (key, child) in entries {
            if key == self.merge_key {
                // Merge sources live at the enclosing mapping's path.
                if let Some(source) = self.resolve_node(tracker, *child, path)? {
                    sources.push(source);
                }
                continue;
            }

            let child_path = path.key(key.as_str());
            match self.resolve_node(tracker, *child, &child_path)? {
                Some(value) => {
                    fields.insert(key.clone(), value);
                }
                None => {
                    fields.shift_remove(key.as_str());
                }
            }
        }

        for source in sources {
            fold_merge_source(&mut fields, source, path);
        }

        Ok(Value::Mapping(fields))
    }
}

/// Folds one resolved merge-key value into `fields`.
fn fold_merge_source(fields: &mut Mapping, source: Value, path: &Path) {
    match source {
        Value::Mapping(map) => fold_mapping(fields, map, path),
        Value::Sequence(items) => {
            for item in items {
                match item {
                    Value::Mapping(map) => fold_mapping(fields, map, path),
                    other => {
                        debug!(path = %path, kind = other.kind(), "Ignoring non-mapping merge source element");
                    }
                }
            }
        }
        Value::Scalar(_) => {
            debug!(path = %path, "Ignoring scalar merge source");
        }
    }
}

fn fold_mapping(fields: &mut Mapping, source: Mapping, path: &Path) {
    for (key, incoming) in source {
        match fields.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => {
                let field_path = path.key(slot.key().as_str());
                match (slot.get_mut(), incoming) {
                    (Value::Sequence(local), Value::Sequence(items)) => {
                        append_unique(local, items);
                    }
                    (local, incoming @ Value::Scalar(_)) if local.is_scalar() => {
                        debug!(path = %field_path, "Merge source overrides local field");
                        *local = incoming;
                    }
                    (local, incoming) => {
                        debug!(
                            path = %field_path,
                            local = local.kind(),
                            source = incoming.kind(),
                            "Keeping local field over merge source of another shape"
                        );
                    }
                }
            }
        }
    }
}

/// Appends `incoming` to `local`, skipping elements scalar-equal to one of
/// `local`'s original elements.
///
/// The result is `local ++ (incoming \ local)`. Duplicates are only checked
/// against the elements `local` had on entry, so repeats inside `incoming`
/// survive: `[a]` merged with `[b, b]` gives `[a, b, b]`, not `[a, b]`.
fn append_unique(local: &mut Vec<Value>, incoming: Vec<Value>) {
    let original = local.len();
    for item in incoming {
        let duplicate = item.is_scalar() && local[..original].contains(&item);
        if !duplicate {
            local.push(item);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Visiting,
    Done,
}

/// Pre-pass recording where each anchored or aliased node is defined.
///
/// Only non-alias edges are followed, so the first path at which a node is
/// reached is its definition path. A structural loop that does not go
/// through an alias cannot come from YAML text and is reported as a cycle.
struct AnchorIndex<'a> {
    doc: &'a Document,
    merge_key: &'a str,
    targets: HashSet<NodeId>,
    visits: HashMap<NodeId, Visit>,
    frames: HashMap<NodeId, Path>,
}

impl<'a> AnchorIndex<'a> {
    fn build(doc: &'a Document, root: NodeId, merge_key: &'a str) -> Result<HashMap<NodeId, Path>> {
        let targets = doc
            .iter()
            .filter_map(|(_, node)| match node.kind {
                NodeKind::Alias(target) => Some(target),
                _ => None,
            })
            .collect();

        let mut index = AnchorIndex {
            doc,
            merge_key,
            targets,
            visits: HashMap::new(),
            frames: HashMap::new(),
        };
        index.walk(root, Path::root())?;
        Ok(index.frames)
    }

    fn walk(&mut self, id: NodeId, path: Path) -> Result<()> {
        match self.visits.get(&id) {
            Some(Visit::Visiting) => {
                return Err(MergeError::Cycle {
                    path: path.to_string(),
                });
            }
            Some(Visit::Done) => return Ok(()),
            None => {}
        }

        let doc = self.doc;
        let node = doc.node(id);
        if node.anchor.is_some() || self.targets.contains(&id) {
            self.frames.entry(id).or_insert_with(|| path.clone());
        }

        self.visits.insert(id, Visit::Visiting);
        match &node.kind {
            NodeKind::Sequence(items) => {
                for (index, &item) in items.iter().enumerate() {
                    self.walk(item, path.index(index))?;
                }
            }
            NodeKind::Mapping(entries) => {
                for (key, child) in entries {
                    let child_path = if key == self.merge_key {
                        path.clone()
                    } else {
                        path.key(key.as_str())
                    };
                    self.walk(*child, child_path)?;
                }
            }
            NodeKind::Scalar(_) | NodeKind::Alias(_) => {}
        }
        self.visits.insert(id, Visit::Done);
        Ok(())
    }
}
