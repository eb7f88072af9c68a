//! OriginVault Schema Catalog
//!
//! A static catalog of JSON Schema documents (credentials, node and cluster
//! declarations, governance agreements, tooling configs) bundled with a
//! content hash per schema.
//!
//! ## Features
//!
//! - **Embedded**: Schemas and their manifest are compiled into the crate
//! - **Typed names**: [`SchemaName`] is the closed set of registered schemas
//! - **Content hashes**: SHA-256 over canonical JSON, truncated to 16 hex chars
//! - **Drift detection**: Regenerate from source and compare with the manifest
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── credentials/
//! │   └── TrustScore.schema.json
//! ├── governance/
//! ├── nodes/
//! ├── roles/
//! │   └── Admin.schema.json
//! └── tooling/
//! generated/
//! └── manifest.json        # name -> {id, hash, version, path}
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use originvault_schemas::{
//!     get_schema_by_name, get_schema_hash, validate_schema_hash, SchemaName,
//! };
//!
//! let schema = get_schema_by_name(SchemaName::TrustScore);
//! assert_eq!(schema["$id"], "https://schemas.originvault.box/TrustScore");
//!
//! let hash = get_schema_hash(SchemaName::TrustScore);
//! assert!(validate_schema_hash("TrustScore", hash.as_str()));
//! assert!(!validate_schema_hash("NotARealSchema", hash.as_str()));
//! ```

pub mod canonical;
pub mod check;
pub mod config;
pub mod drift;
pub mod embedded;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod name;
pub mod registry;
pub mod schema;
pub mod source;

pub use canonical::canonical_json;
pub use config::{CatalogConfig, OutputFormat};
pub use drift::{Change, DriftReport};
pub use embedded::{
    catalog, get_metadata, get_schema_by_name, get_schema_hash, schema_names, validate_schema_hash,
};
pub use error::{CatalogError, Result};
pub use hash::SchemaHash;
pub use manifest::{GenerateOptions, Manifest, ManifestEntry};
pub use name::SchemaName;
pub use registry::{IntegrityFailure, RegistryBuilder, SchemaRegistry};
pub use schema::{SchemaMetadata, SchemaSource};
pub use source::collect_sources;
