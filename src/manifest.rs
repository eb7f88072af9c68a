//! Generated catalog manifest
//!
//! The manifest is the serialized Hash Index and Metadata Index. It is written
//! by `schema-catalog generate` to `generated/manifest.json` and read back at
//! load time, so lookups never need to rehash a document.
//!
//! Generation is deterministic: the same sources always produce the same bytes.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::config::OutputFormat;
use crate::error::{CatalogError, Result};
use crate::hash::{SchemaHash, HASH_ALGORITHM};
use crate::schema::{resolve_id, SchemaSource, DEFAULT_ID_BASE, DEFAULT_SCHEMA_VERSION};
use crate::source::{name_from_file, validate_name};

/// One registered schema as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub id: String,
    pub hash: SchemaHash,
    pub version: Version,
    /// Source path relative to the schemas directory
    pub path: String,
}

impl ManifestEntry {
    /// Check that `path` names this entry's schema file
    pub fn check_path(&self) -> Result<()> {
        let file_name = self.path.rsplit('/').next().unwrap_or(&self.path);
        if name_from_file(file_name) == Some(self.name.as_str()) {
            Ok(())
        } else {
            Err(CatalogError::InvalidFormat(format!(
                "manifest entry {} points at {}",
                self.name, self.path
            )))
        }
    }
}

/// The generated artifact consumed at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub catalog_version: Version,
    pub algorithm: String,
    /// Base URL the synthetic ids were derived from
    pub id_base: String,
    /// Entries in registry insertion order
    pub schemas: Vec<ManifestEntry>,
}

/// Options for manifest generation
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Base URL for synthetic ids
    pub id_base: String,
    /// Version stamped on the catalog and every entry
    pub version: Version,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            id_base: DEFAULT_ID_BASE.to_string(),
            version: DEFAULT_SCHEMA_VERSION,
        }
    }
}

impl Manifest {
    /// Hash every source and build the manifest in source order
    pub fn generate(sources: &[SchemaSource], options: &GenerateOptions) -> Self {
        let schemas = sources
            .iter()
            .map(|source| {
                let hash = SchemaHash::of(&source.document);
                tracing::debug!(schema = %source.name, %hash, "hashed schema");
                ManifestEntry {
                    name: source.name.clone(),
                    id: resolve_id(&source.document, &source.name, &options.id_base),
                    hash,
                    version: options.version.clone(),
                    path: source.path.clone(),
                }
            })
            .collect();

        Self {
            catalog_version: options.version.clone(),
            algorithm: HASH_ALGORITHM.to_string(),
            id_base: options.id_base.clone(),
            schemas,
        }
    }

    /// Parse and validate a manifest
    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Serialize with a trailing newline
    pub fn to_json(&self, format: OutputFormat) -> Result<String> {
        let mut content = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(self)?,
            OutputFormat::Compact => serde_json::to_string(self)?,
        };
        content.push('\n');
        Ok(content)
    }

    /// Write the manifest, creating parent directories as needed
    pub fn write(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json(format)?)?;
        Ok(())
    }

    /// Get an entry by schema name
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.schemas.iter().find(|e| e.name == name)
    }

    /// Schema names in registry order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.algorithm != HASH_ALGORITHM {
            return Err(CatalogError::InvalidFormat(format!(
                "unsupported hash algorithm {:?}, expected {:?}",
                self.algorithm, HASH_ALGORITHM
            )));
        }

        let mut seen = HashSet::with_capacity(self.schemas.len());
        for entry in &self.schemas {
            validate_name(&entry.name)?;
            entry.check_path()?;
            if !seen.insert(entry.name.as_str()) {
                return Err(CatalogError::AlreadyRegistered {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(())
    }
}
