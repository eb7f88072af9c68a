//! Error types for the schema catalog

use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Schema catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Schema not found: {name}")]
    NotFound { name: String },

    #[error("Schema already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Duplicate schema name {name}: {} and {}", .first.display(), .second.display())]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Invalid schema name: {0}")]
    InvalidName(String),

    #[error("Invalid schema hash: {0:?}")]
    InvalidHash(String),

    #[error("Schema {name} is listed in the manifest but {path} is missing")]
    MissingDocument { name: String, path: String },

    #[error("Schema {name} id mismatch: manifest has {manifest}, document resolves to {document}")]
    IdMismatch {
        name: String,
        manifest: String,
        document: String,
    },

    #[error("Hash mismatch for {name}: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Schema {name} is not co-indexed: missing from {missing_from}")]
    NotCoIndexed {
        name: String,
        missing_from: &'static str,
    },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CatalogError {
    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Whether this error is a lookup of an unregistered name
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
