//! Input document graph.
//!
//! A [`Document`] is what a format decoder hands to this crate: an arena of
//! [`Node`]s where aliases are explicit links to their anchored target rather
//! than copies. Containers can be created empty and filled afterwards, which
//! is how a decoder (or a test) expresses an anchor that is referenced from
//! inside itself.
//!
//! ```
//! use yaml_overlay_core::{Directive, Document};
//!
//! // networks:
//! //   test: !reset {}
//! let mut doc = Document::new("override.yaml");
//! let empty = doc.mapping(Vec::new());
//! doc.set_directive(empty, Directive::Reset);
//! let networks = doc.mapping(vec![("test".into(), empty)]);
//! let root = doc.mapping(vec![("networks".into(), networks)]);
//! doc.set_root(root);
//! assert_eq!(doc.len(), 3);
//! ```

use crate::value::{Scalar, Value};

/// Per-node annotation controlling how later files merge into this path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Ordinary deep merge.
    #[default]
    Plain,
    /// Replace the accumulated subtree wholesale.
    Override,
    /// Delete the subtree from the final merged tree.
    Reset,
}

/// Handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shape of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Sequence(Vec<NodeId>),
    /// Ordered entries; keys may repeat (several merge keys on one level).
    Mapping(Vec<(String, NodeId)>),
    /// Reference to an anchored node elsewhere in the same document.
    Alias(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub directive: Directive,
    pub anchor: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            directive: Directive::Plain,
            anchor: None,
        }
    }
}

/// One decoded input document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    name: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Builds an alias-free, directive-free document from a plain tree.
    pub fn from_value(name: impl Into<String>, value: &Value) -> Self {
        let mut doc = Self::new(name);
        let root = doc.insert_value(value);
        doc.set_root(root);
        doc
    }

    fn insert_value(&mut self, value: &Value) -> NodeId {
        match value {
            Value::Scalar(scalar) => self.scalar(scalar.clone()),
            Value::Sequence(items) => {
                let ids = items.iter().map(|item| self.insert_value(item)).collect();
                self.sequence(ids)
            }
            Value::Mapping(map) => {
                let entries = map
                    .iter()
                    .map(|(key, child)| (key.clone(), self.insert_value(child)))
                    .collect();
                self.mapping(entries)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Iterates nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    pub fn scalar(&mut self, scalar: impl Into<Scalar>) -> NodeId {
        self.add(NodeKind::Scalar(scalar.into()))
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Sequence(items))
    }

    pub fn mapping(&mut self, entries: Vec<(String, NodeId)>) -> NodeId {
        self.add(NodeKind::Mapping(entries))
    }

    pub fn alias(&mut self, target: NodeId) -> NodeId {
        self.add(NodeKind::Alias(target))
    }

    /// Appends `item` to the sequence `seq`. Returns `false` if `seq` is not a
    /// sequence.
    pub fn push_item(&mut self, seq: NodeId, item: NodeId) -> bool {
        match &mut self.nodes[seq.0].kind {
            NodeKind::Sequence(items) => {
                items.push(item);
                true
            }
            _ => false,
        }
    }

    /// Appends an entry to the mapping `map`. Returns `false` if `map` is not
    /// a mapping.
    pub fn push_entry(&mut self, map: NodeId, key: impl Into<String>, value: NodeId) -> bool {
        match &mut self.nodes[map.0].kind {
            NodeKind::Mapping(entries) => {
                entries.push((key.into(), value));
                true
            }
            _ => false,
        }
    }

    pub fn set_directive(&mut self, id: NodeId, directive: Directive) {
        self.nodes[id.0].directive = directive;
    }

    pub fn set_anchor(&mut self, id: NodeId, anchor: impl Into<String>) {
        self.nodes[id.0].anchor = Some(anchor.into());
    }
}
