//! The catalog compiled into this crate
//!
//! `schemas/` is embedded with `include_dir!` and the generated manifest with
//! `include_str!`. The registry is built on first access and shared for the
//! rest of the process. Embedded data that fails to load is a build defect,
//! so the first access panics instead of serving a partial catalog.

use std::path::Path;
use std::sync::OnceLock;

use include_dir::{include_dir, Dir};
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::hash::SchemaHash;
use crate::manifest::Manifest;
use crate::name::SchemaName;
use crate::registry::SchemaRegistry;
use crate::schema::{SchemaMetadata, SCHEMA_FILE_SUFFIX};

static SCHEMAS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

static MANIFEST_JSON: &str = include_str!("../generated/manifest.json");

static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// The embedded manifest as shipped with this crate
pub fn embedded_manifest() -> Result<Manifest> {
    Manifest::from_json(MANIFEST_JSON)
}

/// Build a fresh registry from the embedded data
///
/// Checks that the embedded files, the manifest and [`SchemaName`] all
/// describe the same set of schemas.
pub fn load_embedded() -> Result<SchemaRegistry> {
    let manifest = embedded_manifest()?;

    let registry = SchemaRegistry::from_manifest(&manifest, |entry| {
        let Some(file) = SCHEMAS_DIR.get_file(&entry.path) else {
            return Ok(None);
        };
        let content = file.contents_utf8().ok_or_else(|| {
            CatalogError::InvalidFormat(format!("{} is not valid UTF-8", entry.path))
        })?;
        Ok(Some(serde_json::from_str(content)?))
    })?;

    let mut files = Vec::new();
    collect_embedded_files(&SCHEMAS_DIR, &mut files);
    for path in files {
        if !manifest.schemas.iter().any(|e| Path::new(&e.path) == path) {
            return Err(CatalogError::NotCoIndexed {
                name: path.display().to_string(),
                missing_from: "manifest",
            });
        }
    }

    for name in SchemaName::ALL {
        if !registry.contains(name.as_str()) {
            return Err(CatalogError::NotCoIndexed {
                name: name.to_string(),
                missing_from: "manifest",
            });
        }
    }
    for name in registry.names() {
        name.parse::<SchemaName>().map_err(|_| CatalogError::NotCoIndexed {
            name: name.to_string(),
            missing_from: "SchemaName",
        })?;
    }

    Ok(registry)
}

fn collect_embedded_files<'a>(dir: &'a Dir<'static>, files: &mut Vec<&'a Path>) {
    for file in dir.files() {
        let path = file.path();
        let is_schema = path
            .file_name()
            .and_then(|f| f.to_str())
            .map(|f| f.ends_with(SCHEMA_FILE_SUFFIX))
            .unwrap_or(false);
        if is_schema {
            files.push(path);
        }
    }

    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

/// The process-wide embedded registry
///
/// # Panics
///
/// On first access, if the embedded schemas or manifest are malformed or not
/// co-indexed with [`SchemaName`].
pub fn catalog() -> &'static SchemaRegistry {
    REGISTRY.get_or_init(|| match load_embedded() {
        Ok(registry) => registry,
        Err(e) => panic!("embedded schema catalog failed to load: {}", e),
    })
}

// Every SchemaName is present once catalog() has returned.
fn registered<T>(lookup: Result<T>) -> T {
    match lookup {
        Ok(value) => value,
        Err(e) => unreachable!("embedded catalog is co-indexed with SchemaName: {}", e),
    }
}

/// The schema document registered under `name`
pub fn get_schema_by_name(name: SchemaName) -> &'static Value {
    registered(catalog().schema(name.as_str()))
}

/// The precomputed content hash of `name`
pub fn get_schema_hash(name: SchemaName) -> &'static SchemaHash {
    registered(catalog().hash(name.as_str()))
}

/// The metadata record of `name`
pub fn get_metadata(name: SchemaName) -> &'static SchemaMetadata {
    registered(catalog().metadata(name.as_str()))
}

/// Whether `candidate` is the stored hash of the schema called `name`
///
/// Takes untrusted input: unknown names, empty or malformed candidates all
/// yield `false`.
pub fn validate_schema_hash(name: &str, candidate: &str) -> bool {
    catalog().validate_hash(name, candidate)
}

/// Every registered schema name, in registry order
pub fn schema_names() -> &'static [SchemaName] {
    SchemaName::ALL
}
