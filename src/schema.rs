//! Schema documents, sources and metadata records

use std::path::PathBuf;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::hash::SchemaHash;

/// Base URL for synthetic ids of schemas that declare no `$id`
pub const DEFAULT_ID_BASE: &str = "https://schemas.originvault.box";

/// Version assigned to every schema in the catalog
pub const DEFAULT_SCHEMA_VERSION: Version = Version::new(1, 0, 0);

/// File suffix of schema source files
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// The `$id` a schema document declares, if any
pub fn declared_id(document: &serde_json::Value) -> Option<&str> {
    document.get("$id").and_then(|v| v.as_str())
}

/// The id recorded for a schema: its `$id`, or `{id_base}/{name}`
pub fn resolve_id(document: &serde_json::Value, name: &str, id_base: &str) -> String {
    match declared_id(document) {
        Some(id) => id.to_string(),
        None => format!("{}/{}", id_base.trim_end_matches('/'), name),
    }
}

/// A schema read from the source tree at generation time
#[derive(Debug, Clone)]
pub struct SchemaSource {
    /// Registry key, taken from the file name (e.g. "TrustScore")
    pub name: String,
    /// Path relative to the schemas directory, `/`-separated
    pub path: String,
    /// Absolute or caller-relative location the document was read from
    pub origin: PathBuf,
    /// The parsed document
    pub document: serde_json::Value,
}

impl SchemaSource {
    /// Category directory the schema lives in (e.g. "credentials")
    pub fn category(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(dir, _)| dir)
    }
}

/// Read-only summary of a registered schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub name: String,
    pub id: String,
    pub hash: SchemaHash,
    pub version: Version,
}
