//! Loader options.
//!
//! Options are plain serde data so they can live in a YAML file next to the
//! configuration they describe. Every field has a default; an empty file is a
//! valid options file.
//!
//! # Example YAML
//!
//! ```yaml
//! merge_key: "<<"
//! override_tag: "!override"
//! reset_tag: "!reset"
//! apply_resets: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use yaml_overlay_core::{DEFAULT_MERGE_KEY, Directive, Resolver};

use crate::error::Result;

/// Controls how input files are decoded and merged.
///
/// # Examples
///
/// ```
/// use yaml_overlay_loader::LoadOptions;
///
/// let options: LoadOptions = serde_yaml::from_str("apply_resets: false").unwrap();
/// assert_eq!(options.merge_key, "<<");
/// assert_eq!(options.reset_tag, "!reset");
/// assert!(!options.apply_resets);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Mapping key whose value is folded into the enclosing mapping.
    pub merge_key: String,
    /// Tag marking a subtree that replaces earlier files' content.
    pub override_tag: String,
    /// Tag marking a subtree to delete from the final result.
    pub reset_tag: String,
    /// Apply collected resets before returning. When `false` the merged tree
    /// still contains reset paths and the caller gets them in
    /// [`LoadedModel::resets`](crate::LoadedModel::resets).
    pub apply_resets: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            merge_key: DEFAULT_MERGE_KEY.to_string(),
            override_tag: "!override".to_string(),
            reset_tag: "!reset".to_string(),
            apply_resets: true,
        }
    }
}

impl LoadOptions {
    /// Loads options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::LoadError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::LoadError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_yaml::from_reader(reader)?;
        Ok(options)
    }

    /// Saves the options as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::LoadError::Io) if the file cannot be written, or
    /// [`Yaml`](crate::LoadError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Maps a full tag (handle plus suffix, e.g. `!reset`) to a directive.
    pub fn directive_for(&self, tag: &str) -> Directive {
        if tag == self.reset_tag {
            Directive::Reset
        } else if tag == self.override_tag {
            Directive::Override
        } else {
            Directive::Plain
        }
    }

    /// Resolver configured with this merge key.
    pub fn resolver(&self) -> Resolver {
        Resolver::new().with_merge_key(self.merge_key.as_str())
    }
}
