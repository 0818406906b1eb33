//! YAML front end for layered configuration.
//!
//! This crate turns an ordered list of YAML files into one merged tree. It
//! decodes each file into a [`Document`](yaml_overlay_core::Document) graph
//! that keeps anchors, aliases and the `!override` / `!reset` tags, then runs
//! the `yaml-overlay-core` resolve and merge pipeline over them.
//!
//! # Quick start
//!
//! ```
//! use serde::Deserialize;
//! use yaml_overlay_loader::{ConfigFile, LoadOptions, load};
//!
//! #[derive(Deserialize)]
//! struct Compose {
//!     services: std::collections::BTreeMap<String, Service>,
//! }
//!
//! #[derive(Deserialize)]
//! struct Service {
//!     image: String,
//!     #[serde(default)]
//!     ports: Vec<String>,
//! }
//!
//! let base = ConfigFile::new(
//!     "compose.yaml",
//!     "services:\n  web:\n    image: nginx\n    ports: [\"80:80\"]\n",
//! );
//! let over = ConfigFile::new(
//!     "compose.override.yaml",
//!     "services:\n  web:\n    image: nginx:alpine\n    ports: !reset []\n",
//! );
//!
//! let model = load(&[base, over], &LoadOptions::default()).unwrap();
//! let compose: Compose = model.decode().unwrap();
//! assert_eq!(compose.services["web"].image, "nginx:alpine");
//! assert!(compose.services["web"].ports.is_empty());
//! ```

mod config;
mod decode;
mod error;
mod loader;
mod scalar;

pub use config::LoadOptions;
pub use decode::parse_document;
pub use error::{LoadError, Result};
pub use loader::{ConfigFile, LoadedModel, SourceInfo, load, load_paths};
