//! Error types for loading layered configuration files.

use thiserror::Error;
use yaml_overlay_core::MergeError;
use yaml_rust2::scanner::ScanError;

/// Errors that can occur while reading, decoding or merging input files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not well-formed YAML.
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ScanError,
    },

    /// A mapping key that is not a scalar (or an alias to one).
    #[error("{file}: unsupported non-scalar mapping key under {path}")]
    UnsupportedKey { file: String, path: String },

    /// An alias whose anchor was never registered.
    #[error("{file}: alias refers to unknown anchor #{anchor}")]
    UnknownAlias { file: String, anchor: usize },

    /// Directive resolution failed (alias cycle).
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Typed decoding of the merged tree failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`LoadError`].
pub type Result<T> = std::result::Result<T, LoadError>;
