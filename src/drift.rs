//! Schema Drift Detection
//!
//! Compares the committed manifest against a fresh generation from the source
//! tree. Anything removed, any property removed or retyped, and any property
//! that became required counts as breaking. A changed schema whose committed
//! document is no longer available cannot be classified and counts as
//! breaking too.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::manifest::Manifest;
use crate::schema::SchemaSource;

#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub has_any_changes: bool,
    pub has_breaking_changes: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<SchemaChange>,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaChange {
    /// Schema name
    pub name: String,
    /// Hash recorded in the committed manifest
    pub committed_hash: String,
    /// Hash of the current source
    pub current_hash: String,
    /// Whether this is a breaking change
    pub is_breaking: bool,
    /// Property-level description of what changed
    pub changes: Vec<Change>,
}

/// One difference between a committed and a current schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Removed { property: String },
    Added { property: String },
    TypeChanged { property: String, from: String, to: String },
    NowRequired { property: String },
    NoLongerRequired { property: String },
    /// Differences outside `properties` and `required`
    Other,
    /// The committed document is unavailable
    Unknown,
}

impl Change {
    pub fn is_breaking(&self) -> bool {
        matches!(
            self,
            Change::Removed { .. }
                | Change::TypeChanged { .. }
                | Change::NowRequired { .. }
                | Change::Unknown
        )
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Removed { property } => write!(f, "Property '{}' removed", property),
            Change::Added { property } => write!(f, "Property '{}' added", property),
            Change::TypeChanged { property, from, to } => {
                write!(f, "Property '{}' type changed: {} -> {}", property, from, to)
            }
            Change::NowRequired { property } => {
                write!(f, "Property '{}' is now required", property)
            }
            Change::NoLongerRequired { property } => {
                write!(f, "Property '{}' is no longer required", property)
            }
            Change::Other => f.write_str("Content changed outside properties"),
            Change::Unknown => f.write_str("Content changed (committed document unavailable)"),
        }
    }
}

impl DriftReport {
    /// Compare a committed manifest with one freshly generated from `sources`
    ///
    /// `previous` supplies the committed documents, when still available, so
    /// that changed schemas can be described property by property.
    pub fn compare(
        committed: &Manifest,
        fresh: &Manifest,
        sources: &[SchemaSource],
        previous: &HashMap<String, Value>,
    ) -> Self {
        let committed_names: HashSet<&str> = committed.names().collect();
        let fresh_names: HashSet<&str> = fresh.names().collect();

        let mut added: Vec<String> = fresh_names
            .difference(&committed_names)
            .map(|s| s.to_string())
            .collect();
        added.sort();

        let mut removed: Vec<String> = committed_names
            .difference(&fresh_names)
            .map(|s| s.to_string())
            .collect();
        removed.sort();

        let mut changed = Vec::new();
        let mut unchanged = 0;

        for entry in &committed.schemas {
            let Some(current) = fresh.get(&entry.name) else {
                continue;
            };
            if current.hash == entry.hash {
                unchanged += 1;
                continue;
            }

            let new_doc = sources
                .iter()
                .find(|s| s.name == entry.name)
                .map(|s| &s.document);
            let changes = match (previous.get(&entry.name), new_doc) {
                (Some(old), Some(new)) => detect_changes(old, new),
                _ => vec![Change::Unknown],
            };
            let is_breaking = changes.iter().any(Change::is_breaking);

            tracing::warn!(
                schema = %entry.name,
                committed = %entry.hash,
                current = %current.hash,
                is_breaking,
                "schema drifted"
            );
            changed.push(SchemaChange {
                name: entry.name.clone(),
                committed_hash: entry.hash.to_string(),
                current_hash: current.hash.to_string(),
                is_breaking,
                changes,
            });
        }

        changed.sort_by(|a, b| a.name.cmp(&b.name));

        let has_any_changes = !added.is_empty() || !removed.is_empty() || !changed.is_empty();
        let has_breaking_changes = !removed.is_empty() || changed.iter().any(|c| c.is_breaking);

        Self {
            has_any_changes,
            has_breaking_changes,
            added,
            removed,
            changed,
            unchanged,
        }
    }

    pub fn breaking_count(&self) -> usize {
        self.changed.iter().filter(|c| c.is_breaking).count()
    }

    /// Total schemas compared
    pub fn total(&self) -> usize {
        self.unchanged + self.added.len() + self.removed.len() + self.changed.len()
    }
}

fn type_label(prop: &Value) -> String {
    prop.get("type")
        .map(Value::to_string)
        .unwrap_or_else(|| "none".to_string())
}

/// Detect specific changes between two schema documents
pub fn detect_changes(old: &Value, new: &Value) -> Vec<Change> {
    let mut changes = Vec::new();

    if let (Some(old_props), Some(new_props)) = (
        old.get("properties").and_then(|p| p.as_object()),
        new.get("properties").and_then(|p| p.as_object()),
    ) {
        for key in old_props.keys() {
            if !new_props.contains_key(key) {
                changes.push(Change::Removed { property: key.clone() });
            }
        }

        for key in new_props.keys() {
            if !old_props.contains_key(key) {
                changes.push(Change::Added { property: key.clone() });
            }
        }

        for (key, old_prop) in old_props {
            if let Some(new_prop) = new_props.get(key) {
                if old_prop.get("type") != new_prop.get("type") {
                    changes.push(Change::TypeChanged {
                        property: key.clone(),
                        from: type_label(old_prop),
                        to: type_label(new_prop),
                    });
                }
            }
        }
    }

    let required = |v: &Value| -> HashSet<String> {
        v.get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).map(String::from).collect())
            .unwrap_or_default()
    };
    let old_req = required(old);
    let new_req = required(new);

    let mut now_required: Vec<_> = new_req.difference(&old_req).collect();
    now_required.sort();
    for name in now_required {
        changes.push(Change::NowRequired { property: name.clone() });
    }
    let mut no_longer: Vec<_> = old_req.difference(&new_req).collect();
    no_longer.sort();
    for name in no_longer {
        changes.push(Change::NoLongerRequired { property: name.clone() });
    }

    if changes.is_empty() {
        changes.push(Change::Other);
    }

    changes
}
