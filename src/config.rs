//! Configuration for the schema catalog tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (catalog.toml)
//! - Environment variables (CATALOG__*)
//!
//! ## Example config file (catalog.toml):
//! ```toml
//! [catalog]
//! schemas_dir = "schemas"
//! manifest_path = "generated/manifest.json"
//! id_base = "https://schemas.originvault.box"
//! version = "1.0.0"
//!
//! [generation]
//! output_format = "pretty"
//!
//! [drift]
//! strict = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manifest::GenerateOptions;
use crate::schema::{DEFAULT_ID_BASE, DEFAULT_SCHEMA_VERSION};

/// Main configuration for the schema catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Source and artifact locations
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Manifest generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Drift check settings
    #[serde(default)]
    pub drift: DriftConfig,
}

/// Catalog locations and identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Directory holding `<category>/<Name>.schema.json` sources
    #[serde(default = "default_schemas_dir")]
    pub schemas_dir: PathBuf,

    /// Generated manifest location
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Base URL for synthetic ids
    #[serde(default = "default_id_base")]
    pub id_base: String,

    /// Version stamped on generated entries
    #[serde(default = "default_version")]
    pub version: Version,
}

/// Manifest generation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Drift check configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Fail on any drift, not only breaking drift
    #[serde(default)]
    pub strict: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_schemas_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("generated/manifest.json")
}

fn default_id_base() -> String {
    DEFAULT_ID_BASE.to_string()
}

fn default_version() -> Version {
    DEFAULT_SCHEMA_VERSION
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            schemas_dir: default_schemas_dir(),
            manifest_path: default_manifest_path(),
            id_base: default_id_base(),
            version: default_version(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["catalog.toml", ".catalog.toml", "config/catalog.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("box", "originvault", "schemas") {
            let xdg_config = config_dir.config_dir().join("catalog.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // CATALOG__CATALOG__SCHEMAS_DIR=...
        builder = builder.add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Options for manifest generation
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            id_base: self.catalog.id_base.clone(),
            version: self.catalog.version.clone(),
        }
    }

    /// Schemas directory, resolved against the current directory
    pub fn schemas_dir(&self) -> PathBuf {
        resolve(&self.catalog.schemas_dir)
    }

    /// Manifest path, resolved against the current directory
    pub fn manifest_path(&self) -> PathBuf {
        resolve(&self.catalog.manifest_path)
    }
}

fn resolve(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CatalogConfig::default();
        assert_eq!(config.catalog.schemas_dir, PathBuf::from("schemas"));
        assert_eq!(config.catalog.manifest_path, PathBuf::from("generated/manifest.json"));
        assert_eq!(config.catalog.version, Version::new(1, 0, 0));
        assert_eq!(config.generation.output_format, OutputFormat::Pretty);
        assert!(!config.drift.strict);
    }

    #[test]
    fn test_serialize_config() {
        let config = CatalogConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[catalog]"));
        assert!(toml_str.contains("[generation]"));
        assert!(toml_str.contains("id_base = \"https://schemas.originvault.box\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            concat!(
                "[catalog]\nschemas_dir = \"/srv/schemas\"\nversion = \"2.1.0\"\n\n",
                "[generation]\noutput_format = \"compact\"\n",
            ),
        )
        .unwrap();

        let config = CatalogConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.schemas_dir(), PathBuf::from("/srv/schemas"));
        assert_eq!(config.catalog.version, Version::new(2, 1, 0));
        assert_eq!(config.generation.output_format, OutputFormat::Compact);
        // untouched keys keep their defaults
        assert_eq!(config.catalog.id_base, DEFAULT_ID_BASE);

        let options = config.generate_options();
        assert_eq!(options.version, Version::new(2, 1, 0));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        let mut config = CatalogConfig::default();
        config.drift.strict = true;
        config.save(&path).unwrap();

        let reloaded = CatalogConfig::load_from(Some(&path)).unwrap();
        assert!(reloaded.drift.strict);
    }
}
