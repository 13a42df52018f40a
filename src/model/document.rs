use std::path::{Path as FsPath, PathBuf};

use serde_json::Value;

use crate::query::Path;

/// Name of the zone category.
pub const ZONES: &str = "Zones";

/// Name of the surface category.
pub const SURFACES: &str = "Surfaces";

/// A named group of same-kind objects and the paths that locate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    paths: Vec<Path>,
}

impl Category {
    /// Creates a category from already parsed paths.
    #[must_use]
    pub fn new(name: impl Into<String>, paths: Vec<Path>) -> Self {
        Self {
            name: name.into(),
            paths,
        }
    }

    /// The category name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Paths locating the members of this category.
    #[must_use]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
}

/// Errors that can occur when loading a model document from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        /// The file that was being parsed.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },
}

/// Reads and parses a JSON model document.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read and
/// [`LoadError::Json`] if it is not valid JSON.
pub fn load_document(path: &FsPath) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded document from {}", path.display());
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}
