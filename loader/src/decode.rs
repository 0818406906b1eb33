//! YAML text to [`Document`] graph.
//!
//! The decoder listens to `yaml-rust2` parser events instead of a loaded
//! tree, because a loaded tree has already copied every alias and dropped
//! local tags. Here an anchor becomes a node id, an alias becomes a link to
//! it, and a tag matching the configured override/reset tag becomes a
//! [`Directive`] on the node that carries it.
//!
//! Containers are registered under their anchor before their children are
//! read, so an alias nested inside its own anchor links back to the
//! container and the resolver can report the cycle.

use std::collections::HashMap;

use tracing::debug;
use yaml_overlay_core::{Directive, Document, NodeId, NodeKind, Path};
use yaml_rust2::parser::{Event, EventReceiver, Parser, Tag};
use yaml_rust2::scanner::TScalarStyle;

use crate::config::LoadOptions;
use crate::error::{LoadError, Result};
use crate::loader::ConfigFile;
use crate::scalar::{tag_text, type_scalar};

/// Decodes the first YAML document in `file`.
///
/// A file with no document (empty or comments only) yields a [`Document`]
/// without a root.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for malformed YAML,
/// [`LoadError::UnsupportedKey`] for a sequence or mapping used as a mapping
/// key, and [`LoadError::UnknownAlias`] for an alias with no anchor.
pub fn parse_document(file: &ConfigFile, options: &LoadOptions) -> Result<Document> {
    let mut collector = Collector::new(&file.filename, options);
    let mut parser = Parser::new(file.content.chars());
    parser
        .load(&mut collector, false)
        .map_err(|source| LoadError::Parse {
            file: file.filename.clone(),
            source,
        })?;

    let doc = collector.finish()?;
    debug!(file = %file.filename, nodes = doc.len(), "Decoded document");
    Ok(doc)
}

/// An open container on the event stack.
enum Frame {
    Sequence {
        id: NodeId,
        path: Path,
    },
    Mapping {
        id: NodeId,
        path: Path,
        /// Key read but not yet paired with a value.
        pending: Option<String>,
    },
}

struct Collector<'a> {
    file: &'a str,
    options: &'a LoadOptions,
    doc: Document,
    stack: Vec<Frame>,
    anchors: HashMap<usize, NodeId>,
    /// Set after the first document ends; later events are ignored.
    done: bool,
    error: Option<LoadError>,
}

impl<'a> Collector<'a> {
    fn new(file: &'a str, options: &'a LoadOptions) -> Self {
        Self {
            file,
            options,
            doc: Document::new(file),
            stack: Vec::new(),
            anchors: HashMap::new(),
            done: false,
            error: None,
        }
    }

    fn finish(self) -> Result<Document> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.doc),
        }
    }

    fn fail(&mut self, err: LoadError) {
        debug!(file = self.file, error = %err, "Decoding failed");
        self.error = Some(err);
    }

    /// True when the next node read is a mapping key.
    fn at_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { pending: None, .. }))
    }

    /// Path of the node about to be attached.
    fn next_path(&self) -> Path {
        match self.stack.last() {
            None => Path::root(),
            Some(Frame::Sequence { id, path }) => match &self.doc.node(*id).kind {
                NodeKind::Sequence(items) => path.index(items.len()),
                _ => path.clone(),
            },
            Some(Frame::Mapping { path, pending, .. }) => match pending {
                Some(key) if key != &self.options.merge_key => path.key(key.as_str()),
                _ => path.clone(),
            },
        }
    }

    fn directive(&self, tag: Option<&Tag>) -> Directive {
        tag.map(|t| self.options.directive_for(&tag_text(t)))
            .unwrap_or_default()
    }

    fn register(&mut self, anchor: usize, id: NodeId) {
        if anchor != 0 {
            self.anchors.insert(anchor, id);
            self.doc.set_anchor(id, anchor.to_string());
        }
    }

    /// Links a finished (or just opened) node into its parent.
    fn attach(&mut self, id: NodeId) {
        match self.stack.last_mut() {
            None => self.doc.set_root(id),
            Some(Frame::Sequence { id: seq, .. }) => {
                let seq = *seq;
                let pushed = self.doc.push_item(seq, id);
                debug_assert!(pushed, "sequence frame must point at a sequence node");
            }
            Some(Frame::Mapping { id: map, pending, .. }) => {
                let map = *map;
                if let Some(key) = pending.take() {
                    let pushed = self.doc.push_entry(map, key, id);
                    debug_assert!(pushed, "mapping frame must point at a mapping node");
                }
            }
        }
    }

    fn set_key(&mut self, key: String) {
        if let Some(Frame::Mapping { pending, .. }) = self.stack.last_mut() {
            *pending = Some(key);
        }
    }

    fn reject_key(&mut self) {
        let path = self.next_path();
        self.fail(LoadError::UnsupportedKey {
            file: self.file.to_string(),
            path: path.to_string(),
        });
    }

    fn on_scalar(&mut self, text: String, style: TScalarStyle, anchor: usize, tag: Option<Tag>) {
        let at_key = self.at_key();
        // Key scalars only need a node when something can alias them.
        if !at_key || anchor != 0 {
            let id = self.doc.scalar(type_scalar(&text, style, tag.as_ref()));
            if !at_key {
                let directive = self.directive(tag.as_ref());
                self.doc.set_directive(id, directive);
                self.attach(id);
            }
            self.register(anchor, id);
        }
        if at_key {
            self.set_key(text);
        }
    }

    fn on_alias(&mut self, anchor: usize) {
        let Some(&target) = self.anchors.get(&anchor) else {
            self.fail(LoadError::UnknownAlias {
                file: self.file.to_string(),
                anchor,
            });
            return;
        };

        if self.at_key() {
            match &self.doc.node(target).kind {
                NodeKind::Scalar(scalar) => {
                    let key = scalar.to_string();
                    self.set_key(key);
                }
                _ => self.reject_key(),
            }
            return;
        }

        let id = self.doc.alias(target);
        self.attach(id);
    }

    fn on_container_start(&mut self, kind: NodeKind, anchor: usize, tag: Option<Tag>) {
        if self.at_key() {
            self.reject_key();
            return;
        }

        let path = self.next_path();
        let is_sequence = matches!(kind, NodeKind::Sequence(_));
        let directive = self.directive(tag.as_ref());
        let id = self.doc.add(kind);
        self.doc.set_directive(id, directive);
        self.register(anchor, id);
        self.attach(id);

        self.stack.push(if is_sequence {
            Frame::Sequence { id, path }
        } else {
            Frame::Mapping {
                id,
                path,
                pending: None,
            }
        });
    }
}

impl EventReceiver for Collector<'_> {
    fn on_event(&mut self, ev: Event) {
        if self.done || self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(text, style, anchor, tag) => self.on_scalar(text, style, anchor, tag),
            Event::Alias(anchor) => self.on_alias(anchor),
            Event::SequenceStart(anchor, tag) => {
                self.on_container_start(NodeKind::Sequence(Vec::new()), anchor, tag)
            }
            Event::MappingStart(anchor, tag) => {
                self.on_container_start(NodeKind::Mapping(Vec::new()), anchor, tag)
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.stack.pop();
            }
            Event::DocumentEnd => self.done = true,
            _ => {}
        }
    }
}
