//! Drift check of a schema source tree against its committed manifest
//!
//! Exit codes follow the CLI contract: 0 in sync (or non-breaking drift when
//! not strict), 1 for any drift in strict mode or a rejected hash, 2 for
//! breaking drift.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::CatalogConfig;
use crate::drift::DriftReport;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::registry::SchemaRegistry;
use crate::source::collect_sources;

pub const EXIT_OK: i32 = 0;
pub const EXIT_DRIFT: i32 = 1;
pub const EXIT_BREAKING: i32 = 2;

/// Documents from `candidates` that still hash to their committed manifest entry
///
/// A candidate registry can carry the committed hashes next to edited
/// documents (an embedded copy rebuilt from modified sources), so every
/// document is rehashed before it is trusted as the committed version.
pub fn baseline_documents(
    committed: &Manifest,
    candidates: &SchemaRegistry,
) -> HashMap<String, Value> {
    committed
        .schemas
        .iter()
        .filter_map(|entry| {
            let document = candidates.schema(&entry.name).ok()?;
            if entry.hash.verify(document) {
                Some((entry.name.clone(), document.clone()))
            } else {
                tracing::debug!(schema = %entry.name, "no committed document for baseline");
                None
            }
        })
        .collect()
}

/// Regenerate the configured sources and compare them with the committed manifest
pub fn check_drift(
    config: &CatalogConfig,
    baseline: Option<&SchemaRegistry>,
) -> Result<DriftReport> {
    let committed = Manifest::load(config.manifest_path())?;
    let sources = collect_sources(&config.schemas_dir())?;
    let fresh = Manifest::generate(&sources, &config.generate_options());

    let previous = baseline
        .map(|registry| baseline_documents(&committed, registry))
        .unwrap_or_default();

    Ok(DriftReport::compare(&committed, &fresh, &sources, &previous))
}

pub fn drift_exit_code(report: &DriftReport, strict: bool) -> i32 {
    if report.has_breaking_changes {
        EXIT_BREAKING
    } else if report.has_any_changes && strict {
        EXIT_DRIFT
    } else {
        EXIT_OK
    }
}

pub fn verify_exit_code(registry: &SchemaRegistry, name: &str, candidate: &str) -> i32 {
    if registry.validate_hash(name, candidate) {
        EXIT_OK
    } else {
        EXIT_DRIFT
    }
}
