//! Directive-aware merging of layered configuration documents.
//!
//! This crate folds an ordered list of decoded documents (a base file plus
//! override files) into one resolved tree:
//!
//! - [`Document`]: the input graph a format decoder produces. Nodes are
//!   scalars, sequences, mappings or alias links to anchored nodes, each with
//!   a [`Directive`] (`override` / `reset`).
//! - [`resolve`] / [`Resolver`]: single-document pass that expands aliases,
//!   folds merge keys (`<<`) and records directive [`Path`]s. A
//!   [`CycleTracker`] turns self-referencing anchors into
//!   [`MergeError::Cycle`].
//! - [`Merger`] / [`merge_values`]: cross-file fold. Maps deep-merge, the
//!   later file replaces everything else, and `override` paths replace
//!   wholesale.
//! - [`apply_resets`]: deletes every `reset` path once all files are folded.
//!
//! # Example
//!
//! ```
//! use yaml_overlay_core::*;
//!
//! // base.yaml:      networks: { test: { name: test, external: true } }
//! let mut base = Document::new("base.yaml");
//! let name = base.scalar("test");
//! let external = base.scalar(true);
//! let test = base.mapping(vec![("name".into(), name), ("external".into(), external)]);
//! let networks = base.mapping(vec![("test".into(), test)]);
//! let root = base.mapping(vec![("networks".into(), networks)]);
//! base.set_root(root);
//!
//! // override.yaml:  networks: { test: !reset {} }
//! let mut over = Document::new("override.yaml");
//! let empty = over.mapping(Vec::new());
//! over.set_directive(empty, Directive::Reset);
//! let networks = over.mapping(vec![("test".into(), empty)]);
//! let root = over.mapping(vec![("networks".into(), networks)]);
//! over.set_root(root);
//!
//! let outcome = merge_documents(&[base, over]).unwrap();
//! let merged = outcome.value.unwrap();
//! assert!(merged.get("networks").unwrap().get("test").is_none());
//! ```

mod cycle;
mod error;
mod merge;
mod node;
mod path;
mod reset;
mod resolve;
mod value;

pub use cycle::CycleTracker;
pub use error::{MergeError, PathParseError, Result};
pub use merge::{MergeOutcome, Merger, merge_documents, merge_documents_with, merge_values};
pub use node::{Directive, Document, Node, NodeId, NodeKind};
pub use path::{Path, PathSet, Segment};
pub use reset::apply_resets;
pub use resolve::{DEFAULT_MERGE_KEY, Resolution, Resolver, resolve};
pub use value::{Mapping, Scalar, Value};
