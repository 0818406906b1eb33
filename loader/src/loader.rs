//! Multi-file loading.
//!
//! [`load`] decodes every file first and only then resolves and merges them
//! in the order given, so a malformed file aborts the load before anything is
//! merged.
//!
//! ```
//! use yaml_overlay_loader::{ConfigFile, LoadOptions, load};
//!
//! let files = [
//!     ConfigFile::new("compose.yaml", "services:\n  web:\n    image: nginx\n    init: true\n"),
//!     ConfigFile::new("override.yaml", "services:\n  web:\n    init: !reset false\n"),
//! ];
//! let model = load(&files, &LoadOptions::default()).unwrap();
//! let web = model.value.as_ref().and_then(|v| v.get("services")).and_then(|s| s.get("web")).unwrap();
//! assert!(web.get("init").is_none());
//! assert_eq!(model.sources.len(), 2);
//! ```

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::debug;
use yaml_overlay_core::{Merger, PathSet, Value};

use crate::config::LoadOptions;
use crate::decode::parse_document;
use crate::error::Result;

/// One named input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Name used in logs and errors.
    pub filename: String,
    /// Raw YAML text.
    pub content: String,
}

impl ConfigFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Reads a file from disk, naming it by its path.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::LoadError::Io) if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), content))
    }

    /// Hex SHA-256 of the raw content.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.content.as_bytes());
        format!("{:x}", hash)
    }
}

/// Provenance of one merged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub filename: String,
    pub digest: String,
}

/// Result of loading an ordered list of files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedModel {
    /// Merged tree; `None` when every file was empty or the root was reset.
    pub value: Option<Value>,
    /// Every reset path recorded across the files. Already applied to
    /// `value` unless [`LoadOptions::apply_resets`] was `false`.
    pub resets: PathSet,
    /// Input files in merge order.
    pub sources: Vec<SourceInfo>,
}

impl LoadedModel {
    /// Hands the merged tree to typed decoding.
    ///
    /// An empty model decodes from YAML `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](crate::LoadError::Yaml) if the tree does not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let tree = serde_yaml::to_value(&self.value)?;
        Ok(serde_yaml::from_value(tree)?)
    }
}

/// Decodes, resolves and merges `files` in order.
///
/// # Errors
///
/// Returns the first decoding error, or
/// [`Merge`](crate::LoadError::Merge) if a document contains an alias cycle.
pub fn load(files: &[ConfigFile], options: &LoadOptions) -> Result<LoadedModel> {
    let documents = files
        .iter()
        .map(|file| parse_document(file, options))
        .collect::<Result<Vec<_>>>()?;

    let resolver = options.resolver();
    let mut merger = Merger::new();
    for doc in &documents {
        debug!(file = doc.name(), "Merging file");
        merger.fold(resolver.resolve(doc)?);
    }

    let (value, resets) = if options.apply_resets {
        let outcome = merger.finish();
        (outcome.value, outcome.resets)
    } else {
        merger.into_parts()
    };

    let sources = files
        .iter()
        .map(|file| SourceInfo {
            filename: file.filename.clone(),
            digest: file.digest(),
        })
        .collect();

    debug!(
        files = files.len(),
        resets = resets.len(),
        applied = options.apply_resets,
        "Loaded configuration"
    );
    Ok(LoadedModel {
        value,
        resets,
        sources,
    })
}

/// Reads `paths` from disk and loads them in order.
///
/// # Errors
///
/// Returns [`Io`](crate::LoadError::Io) if a file cannot be read, otherwise
/// as [`load`].
pub fn load_paths<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<LoadedModel> {
    let files = paths
        .iter()
        .map(ConfigFile::from_path)
        .collect::<Result<Vec<_>>>()?;
    load(&files, options)
}
