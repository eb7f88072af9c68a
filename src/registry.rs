//! Schema Registry
//!
//! The Schema Store, Hash Index and Metadata Index, co-indexed by schema name
//! and immutable once built. Lookups are map reads; hashes are only computed
//! when a registry is built from raw documents or when integrity is checked
//! explicitly.

use std::path::Path;

use indexmap::IndexMap;
use semver::Version;
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::hash::SchemaHash;
use crate::manifest::{Manifest, ManifestEntry};
use crate::schema::{
    resolve_id, SchemaMetadata, SchemaSource, DEFAULT_ID_BASE, DEFAULT_SCHEMA_VERSION,
};
use crate::source::{collect_sources, validate_name};

/// The loaded schema catalog
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    /// Schema Store: name -> document, in insertion order
    store: IndexMap<String, Value>,
    /// Hash Index: name -> precomputed content hash
    hashes: IndexMap<String, SchemaHash>,
    /// Metadata Index: name -> summary record
    metadata: IndexMap<String, SchemaMetadata>,
}

/// A stored hash that no longer matches its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityFailure {
    pub name: String,
    pub expected: SchemaHash,
    pub actual: SchemaHash,
}

/// Incrementally assembles a [`SchemaRegistry`]
#[derive(Debug)]
pub struct RegistryBuilder {
    id_base: String,
    version: Version,
    registry: SchemaRegistry,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            id_base: DEFAULT_ID_BASE.to_string(),
            version: DEFAULT_SCHEMA_VERSION,
            registry: SchemaRegistry {
                store: IndexMap::new(),
                hashes: IndexMap::new(),
                metadata: IndexMap::new(),
            },
        }
    }

    /// Base URL for synthetic ids of schemas without `$id`
    pub fn id_base(mut self, id_base: impl Into<String>) -> Self {
        self.id_base = id_base.into();
        self
    }

    /// Version recorded in the metadata of subsequently inserted schemas
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Register a document under `name` with its precomputed hash
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        document: Value,
        hash: SchemaHash,
    ) -> Result<&mut Self> {
        let name = name.into();
        let id = resolve_id(&document, &name, &self.id_base);
        let version = self.version.clone();
        self.insert_record(name, document, hash, id, version)?;
        Ok(self)
    }

    fn insert_record(
        &mut self,
        name: String,
        document: Value,
        hash: SchemaHash,
        id: String,
        version: Version,
    ) -> Result<()> {
        validate_name(&name)?;
        if self.registry.store.contains_key(&name) {
            return Err(CatalogError::AlreadyRegistered { name });
        }

        let metadata = SchemaMetadata {
            name: name.clone(),
            id,
            hash: hash.clone(),
            version,
        };
        self.registry.store.insert(name.clone(), document);
        self.registry.hashes.insert(name.clone(), hash);
        self.registry.metadata.insert(name, metadata);
        Ok(())
    }

    pub fn build(self) -> SchemaRegistry {
        tracing::info!(schemas = self.registry.len(), "schema registry built");
        self.registry
    }
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from raw documents, hashing each one now
    pub fn from_documents<I, N>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        let mut builder = RegistryBuilder::new();
        for (name, document) in documents {
            let hash = SchemaHash::of(&document);
            builder.insert(name, document, hash)?;
        }
        Ok(builder.build())
    }

    /// Build a registry from a manifest, fetching each document with `load`
    ///
    /// Hashes, ids and versions come from the manifest. Each entry's path must
    /// name its schema file, and its id must equal the id derived from the
    /// document (`$id`, or the manifest's `id_base` plus the name).
    pub fn from_manifest<F>(manifest: &Manifest, mut load: F) -> Result<Self>
    where
        F: FnMut(&ManifestEntry) -> Result<Option<Value>>,
    {
        let mut builder = RegistryBuilder::new().version(manifest.catalog_version.clone());

        for entry in &manifest.schemas {
            entry.check_path()?;
            let document = load(entry)?.ok_or_else(|| CatalogError::MissingDocument {
                name: entry.name.clone(),
                path: entry.path.clone(),
            })?;

            let derived = resolve_id(&document, &entry.name, &manifest.id_base);
            if derived != entry.id {
                return Err(CatalogError::IdMismatch {
                    name: entry.name.clone(),
                    manifest: entry.id.clone(),
                    document: derived,
                });
            }

            tracing::debug!(schema = %entry.name, hash = %entry.hash, "loaded schema");
            builder.insert_record(
                entry.name.clone(),
                document,
                entry.hash.clone(),
                entry.id.clone(),
                entry.version.clone(),
            )?;
        }

        Ok(builder.build())
    }

    /// Load a registry from a schema source tree and its generated manifest
    ///
    /// Fails if a source file is missing from the manifest or vice versa.
    pub fn load_dir(
        schemas_dir: impl AsRef<Path>,
        manifest_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let schemas_dir = schemas_dir.as_ref();
        let manifest = Manifest::load(manifest_path)?;

        let mut sources: IndexMap<String, SchemaSource> = collect_sources(schemas_dir)?
            .into_iter()
            .map(|s| (s.path.clone(), s))
            .collect();

        let registry = Self::from_manifest(&manifest, |entry| {
            Ok(sources.shift_remove(&entry.path).map(|s| s.document))
        })?;

        if let Some((_, orphan)) = sources.first() {
            return Err(CatalogError::NotCoIndexed {
                name: orphan.name.clone(),
                missing_from: "manifest",
            });
        }

        Ok(registry)
    }

    /// Get a schema document by name
    pub fn schema(&self, name: &str) -> Result<&Value> {
        self.store.get(name).ok_or_else(|| CatalogError::not_found(name))
    }

    /// Get the precomputed hash of a schema
    pub fn hash(&self, name: &str) -> Result<&SchemaHash> {
        self.hashes.get(name).ok_or_else(|| CatalogError::not_found(name))
    }

    /// Get the metadata record of a schema
    pub fn metadata(&self, name: &str) -> Result<&SchemaMetadata> {
        self.metadata.get(name).ok_or_else(|| CatalogError::not_found(name))
    }

    /// Whether `candidate` is exactly the stored hash for `name`
    ///
    /// Unknown names and malformed candidates are simply not valid.
    pub fn validate_hash(&self, name: &str, candidate: &str) -> bool {
        self.hashes
            .get(name)
            .map(|hash| hash.matches(candidate))
            .unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    /// Registered names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.store.keys().map(String::as_str)
    }

    /// `(name, document)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.store.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn schemas(&self) -> &IndexMap<String, Value> {
        &self.store
    }

    pub fn hash_index(&self) -> &IndexMap<String, SchemaHash> {
        &self.hashes
    }

    pub fn metadata_index(&self) -> &IndexMap<String, SchemaMetadata> {
        &self.metadata
    }

    /// Registered names that fuzzily match `query`, best first
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&str> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut results: Vec<(i64, &str)> = self
            .names()
            .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
            .collect();

        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        results.into_iter().take(limit).map(|(_, name)| name).collect()
    }

    /// Rehash every document and report the ones that drifted from the Hash Index
    pub fn verify_integrity(&self) -> Vec<IntegrityFailure> {
        self.store
            .iter()
            .filter_map(|(name, document)| {
                let expected = self.hashes.get(name)?;
                let actual = SchemaHash::of(document);
                (actual != *expected).then(|| IntegrityFailure {
                    name: name.clone(),
                    expected: expected.clone(),
                    actual,
                })
            })
            .collect()
    }

    /// Like [`verify_integrity`](Self::verify_integrity), failing on the first mismatch
    pub fn ensure_integrity(&self) -> Result<()> {
        match self.verify_integrity().into_iter().next() {
            Some(failure) => Err(CatalogError::HashMismatch {
                name: failure.name,
                expected: failure.expected.to_string(),
                actual: failure.actual.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::manifest::GenerateOptions;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn admin_doc() -> Value {
        json!({
            "$id": "https://schemas.originvault.box/Admin",
            "title": "Admin",
            "type": "object"
        })
    }

    fn pinned_registry() -> SchemaRegistry {
        let editor = json!({"title": "Editor Config"});
        let mut builder = SchemaRegistry::builder();
        builder
            .insert("Admin", admin_doc(), SchemaHash::parse("dbecfc2f9ba4ddee").unwrap())
            .unwrap()
            .insert("EditorConfig", editor.clone(), SchemaHash::of(&editor))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_validate_pinned_hash() {
        let registry = pinned_registry();
        assert!(registry.validate_hash("Admin", "dbecfc2f9ba4ddee"));
        assert!(!registry.validate_hash("Admin", "0000000000000000"));
        assert!(!registry.validate_hash("Admin", ""));
        assert!(!registry.validate_hash("Admin", "DBECFC2F9BA4DDEE"));
        assert!(!registry.validate_hash("NotARealSchema", "dbecfc2f9ba4ddee"));
        assert!(!registry.validate_hash("", ""));
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let registry = pinned_registry();
        assert!(registry.schema("NotARealSchema").unwrap_err().is_not_found());
        assert!(registry.hash("NotARealSchema").unwrap_err().is_not_found());
        assert!(registry.metadata("NotARealSchema").unwrap_err().is_not_found());
    }

    #[test]
    fn test_metadata_reads_hash_index() {
        let registry = pinned_registry();
        let meta = registry.metadata("Admin").unwrap();
        assert_eq!(meta.name, "Admin");
        assert_eq!(meta.id, "https://schemas.originvault.box/Admin");
        assert_eq!(&meta.hash, registry.hash("Admin").unwrap());
        assert_eq!(meta.version, Version::new(1, 0, 0));

        let editor = registry.metadata("EditorConfig").unwrap();
        assert_eq!(editor.id, "https://schemas.originvault.box/EditorConfig");
    }

    #[test]
    fn test_builder_id_base_and_version() {
        let doc = json!({"title": "Guest"});
        let mut builder = SchemaRegistry::builder()
            .id_base("https://example.test/schemas")
            .version(Version::new(2, 0, 0));
        builder.insert("Guest", doc.clone(), SchemaHash::of(&doc)).unwrap();
        let registry = builder.build();

        let meta = registry.metadata("Guest").unwrap();
        assert_eq!(meta.id, "https://example.test/schemas/Guest");
        assert_eq!(meta.version, Version::new(2, 0, 0));
    }

    #[test]
    fn test_insertion_order_and_co_indexing() {
        let registry = SchemaRegistry::from_documents(vec![
            ("Zeta", json!({"title": "Z"})),
            ("Alpha", json!({"title": "A"})),
            ("Mid", json!({"title": "M"})),
        ])
        .unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert!(registry.hash_index().keys().eq(registry.schemas().keys()));
        assert!(registry.metadata_index().keys().eq(registry.schemas().keys()));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut builder = SchemaRegistry::builder();
        builder.insert("Admin", admin_doc(), SchemaHash::of(&admin_doc())).unwrap();
        let err = builder.insert("Admin", json!({}), SchemaHash::of(&json!({}))).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyRegistered { .. }));
    }

    #[test]
    fn test_integrity_detects_drift() {
        let registry = pinned_registry();
        let failures = registry.verify_integrity();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "Admin");
        assert_eq!(failures[0].actual, SchemaHash::of(&admin_doc()));
        assert!(matches!(
            registry.ensure_integrity(),
            Err(CatalogError::HashMismatch { .. })
        ));

        let clean = SchemaRegistry::from_documents(vec![("Admin", admin_doc())]).unwrap();
        assert!(clean.verify_integrity().is_empty());
        assert!(clean.ensure_integrity().is_ok());
    }

    #[test]
    fn test_suggest() {
        let registry = SchemaRegistry::from_documents(vec![
            ("TrustScore", json!({})),
            ("NodeDeclaration", json!({"a": 1})),
            ("ClusterDeclaration", json!({"a": 2})),
        ])
        .unwrap();

        assert_eq!(registry.suggest("trustscor", 3), vec!["TrustScore"]);
        let decl = registry.suggest("Declaration", 5);
        assert_eq!(decl.len(), 2);
        assert!(registry.suggest("qqqq", 5).is_empty());
    }

    fn write_tree(dir: &Path) -> Manifest {
        let roles = dir.join("schemas/roles");
        fs::create_dir_all(&roles).unwrap();
        fs::write(roles.join("Admin.schema.json"), admin_doc().to_string()).unwrap();
        fs::write(roles.join("Guest.schema.json"), r#"{"title": "Guest"}"#).unwrap();

        let sources = collect_sources(&dir.join("schemas")).unwrap();
        let manifest = Manifest::generate(&sources, &GenerateOptions::default());
        manifest
            .write(dir.join("generated/manifest.json"), OutputFormat::Pretty)
            .unwrap();
        manifest
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        let manifest = write_tree(dir.path());

        let registry = SchemaRegistry::load_dir(
            dir.path().join("schemas"),
            dir.path().join("generated/manifest.json"),
        )
        .unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Admin", "Guest"]);
        assert_eq!(registry.hash("Admin").unwrap(), &manifest.get("Admin").unwrap().hash);
        assert!(registry.ensure_integrity().is_ok());
    }

    #[test]
    fn test_load_dir_rejects_orphan_source() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());
        fs::write(dir.path().join("schemas/roles/Extra.schema.json"), "{}").unwrap();

        let err = SchemaRegistry::load_dir(
            dir.path().join("schemas"),
            dir.path().join("generated/manifest.json"),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NotCoIndexed { missing_from: "manifest", .. }));
    }

    #[test]
    fn test_load_dir_rejects_missing_document() {
        let dir = tempdir().unwrap();
        write_tree(dir.path());
        fs::remove_file(dir.path().join("schemas/roles/Guest.schema.json")).unwrap();

        let err = SchemaRegistry::load_dir(
            dir.path().join("schemas"),
            dir.path().join("generated/manifest.json"),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingDocument { ref name, .. } if name == "Guest"));
    }

    #[test]
    fn test_manifest_id_must_match_document() {
        let dir = tempdir().unwrap();
        let mut manifest = write_tree(dir.path());
        manifest.schemas[0].id = "https://elsewhere.test/Admin".to_string();

        let err =
            SchemaRegistry::from_manifest(&manifest, |_| Ok(Some(admin_doc()))).unwrap_err();
        assert!(matches!(err, CatalogError::IdMismatch { .. }));
    }

    #[test]
    fn test_synthetic_id_must_match_manifest() {
        let dir = tempdir().unwrap();
        let mut manifest = write_tree(dir.path());
        assert_eq!(manifest.schemas[1].name, "Guest");
        manifest.schemas[1].id = "https://elsewhere.test/Whatever".to_string();

        let err = SchemaRegistry::from_manifest(&manifest, |entry| {
            let path = dir.path().join("schemas").join(&entry.path);
            Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::IdMismatch { ref name, ref document, .. }
                if name == "Guest" && document == "https://schemas.originvault.box/Guest"
        ));
    }

    #[test]
    fn test_manifest_entry_must_point_at_its_own_file() {
        let dir = tempdir().unwrap();
        let mut manifest = write_tree(dir.path());
        manifest.schemas[0].path = "roles/Guest.schema.json".to_string();

        let err =
            SchemaRegistry::from_manifest(&manifest, |_| Ok(Some(json!({"title": "Guest"}))))
                .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidFormat(_)));
    }

    #[test]
    fn test_manifest_id_base_is_honoured() {
        let doc = json!({"title": "Guest"});
        let manifest = Manifest::generate(
            &[SchemaSource {
                name: "Guest".to_string(),
                path: "roles/Guest.schema.json".to_string(),
                origin: "roles/Guest.schema.json".into(),
                document: doc.clone(),
            }],
            &GenerateOptions {
                id_base: "https://example.test/schemas".to_string(),
                ..GenerateOptions::default()
            },
        );

        let registry =
            SchemaRegistry::from_manifest(&manifest, |_| Ok(Some(doc.clone()))).unwrap();
        assert_eq!(
            registry.metadata("Guest").unwrap().id,
            "https://example.test/schemas/Guest"
        );
    }
}
