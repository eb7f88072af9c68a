//! Schema source collection
//!
//! Walks the schema source tree (`<category>/<Name>.schema.json`) in a stable
//! order. The walk order becomes the registry's insertion order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::{CatalogError, Result};
use crate::schema::{SchemaSource, SCHEMA_FILE_SUFFIX};

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("static regex"))
}

/// Check that a schema name is a valid registry key
pub fn validate_name(name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(CatalogError::InvalidName(name.to_string()))
    }
}

/// Registry key for a schema file name (`Admin.schema.json` -> `Admin`)
pub fn name_from_file(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(SCHEMA_FILE_SUFFIX)
}

/// Collect every `*.schema.json` under `schema_dir`, sorted by path
pub fn collect_sources(schema_dir: &Path) -> Result<Vec<SchemaSource>> {
    let mut sources = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(schema_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = path
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(name_from_file)
        else {
            continue;
        };
        validate_name(name)?;

        if let Some(first) = seen.get(name) {
            return Err(CatalogError::DuplicateName {
                name: name.to_string(),
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }

        let relative = path.strip_prefix(schema_dir).map_err(|_| {
            CatalogError::InvalidFormat(format!(
                "{} is outside {}",
                path.display(),
                schema_dir.display()
            ))
        })?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            CatalogError::InvalidFormat(format!(
                "Failed to parse JSON in {}: {}",
                path.display(),
                e
            ))
        })?;
        if !document.is_object() {
            return Err(CatalogError::InvalidFormat(format!(
                "{} is not a JSON object",
                path.display()
            )));
        }

        tracing::debug!(schema = name, path = %relative, "collected schema source");
        seen.insert(name.to_string(), path.to_path_buf());
        sources.push(SchemaSource {
            name: name.to_string(),
            path: relative,
            origin: path.to_path_buf(),
            document,
        });
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_sorted_by_path() {
        let dir = tempdir().unwrap();
        write(dir.path(), "roles/Admin.schema.json", r#"{"title": "Admin"}"#);
        write(dir.path(), "credentials/TrustScore.schema.json", r#"{"title": "TrustScore"}"#);
        write(dir.path(), "credentials/Membership.schema.json", r#"{"title": "Membership"}"#);
        write(dir.path(), "README.md", "not a schema");
        write(dir.path(), "roles/notes.json", "{}");

        let sources = collect_sources(dir.path()).unwrap();
        let paths: Vec<_> = sources.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "credentials/Membership.schema.json",
                "credentials/TrustScore.schema.json",
                "roles/Admin.schema.json",
            ]
        );
        assert_eq!(sources[2].name, "Admin");
        assert_eq!(sources[2].category(), Some("roles"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/Admin.schema.json", "{}");
        write(dir.path(), "b/Admin.schema.json", "{}");

        let err = collect_sources(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { ref name, .. } if name == "Admin"));
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "roles/Broken.schema.json", "{ not json");

        let err = collect_sources(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Broken.schema.json"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(validate_name("TrustScore").is_ok());
        assert!(validate_name("trustScore").is_err());
        assert!(validate_name("Trust-Score").is_err());
        assert!(validate_name("").is_err());

        let dir = tempdir().unwrap();
        write(dir.path(), "x/lower.schema.json", "{}");
        assert!(matches!(
            collect_sources(dir.path()),
            Err(CatalogError::InvalidName(_))
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "x/List.schema.json", "[1, 2]");
        assert!(matches!(
            collect_sources(dir.path()),
            Err(CatalogError::InvalidFormat(_))
        ));
    }
}
