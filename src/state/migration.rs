//! Schema migration support for project documents.
//!
//! Documents are upgraded step by step from their recorded schema version
//! to the current one. Documents written before versioning existed carry no
//! `schemaVersion` field and are treated as `1.0`.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{AnimateError, Result};

/// Current schema version for project documents.
pub const CURRENT_SCHEMA_VERSION: &str = "1.1";

/// Version assumed for documents without a `schemaVersion` field.
pub const LEGACY_SCHEMA_VERSION: &str = "1.0";

/// Key holding the schema version in a project document.
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

type MigrationFn = fn(Value) -> Result<Value>;

fn get_migration_registry() -> HashMap<(&'static str, &'static str), MigrationFn> {
    let mut registry: HashMap<(&'static str, &'static str), MigrationFn> = HashMap::new();
    registry.insert(("1.0", "1.1"), migrate_1_0_to_1_1);
    registry
}

/// All known schema versions in order.
fn get_version_order() -> &'static [&'static str] {
    &["1.0", "1.1"]
}

/// Migrate a project document to `CURRENT_SCHEMA_VERSION`.
///
/// # Errors
/// `InvalidSchemaVersion` for versions this build does not know (including
/// documents from a newer release), `MigrationError` if a step fails.
pub fn migrate_project(data: Value) -> Result<Value> {
    let current_version = data
        .get(SCHEMA_VERSION_KEY)
        .and_then(|v| v.as_str())
        .unwrap_or(LEGACY_SCHEMA_VERSION)
        .to_string();

    let versions = get_version_order();
    let start = versions
        .iter()
        .position(|&v| v == current_version)
        .ok_or_else(|| AnimateError::InvalidSchemaVersion {
            version: current_version.clone(),
        })?;
    let target = versions
        .iter()
        .position(|&v| v == CURRENT_SCHEMA_VERSION)
        .ok_or_else(|| AnimateError::Internal("current schema version unregistered".into()))?;

    if start > target {
        return Err(AnimateError::MigrationError {
            from: current_version,
            to: CURRENT_SCHEMA_VERSION.to_string(),
            reason: "Cannot downgrade project from newer schema version".to_string(),
        });
    }

    let registry = get_migration_registry();
    let mut data = data;
    for step in versions[start..=target].windows(2) {
        let (from, to) = (step[0], step[1]);
        let migration_fn = registry
            .get(&(from, to))
            .ok_or_else(|| AnimateError::MigrationError {
                from: from.to_string(),
                to: to.to_string(),
                reason: "No migration path found".to_string(),
            })?;
        data = migration_fn(data)?;
        log::info!("Migrated project document from {} to {}", from, to);
    }

    if let Some(obj) = data.as_object_mut() {
        obj.insert(
            SCHEMA_VERSION_KEY.to_string(),
            Value::String(CURRENT_SCHEMA_VERSION.to_string()),
        );
    }

    Ok(data)
}

/// 1.0 documents are raw editor state: frames may lack `effectsLayer` or
/// `thumbnail`, `currentLayerIndex` may be missing, and cleared layers hold
/// an empty string instead of null.
fn migrate_1_0_to_1_1(mut data: Value) -> Result<Value> {
    let obj = data
        .as_object_mut()
        .ok_or_else(|| AnimateError::MigrationError {
            from: "1.0".to_string(),
            to: "1.1".to_string(),
            reason: "document is not a JSON object".to_string(),
        })?;

    obj.entry("currentLayerIndex").or_insert(Value::from(0));

    if let Some(frames) = obj.get_mut("frames").and_then(Value::as_array_mut) {
        for frame in frames.iter_mut().filter_map(Value::as_object_mut) {
            frame
                .entry("effectsLayer")
                .or_insert_with(|| Value::Array(Vec::new()));
            frame.entry("thumbnail").or_insert(Value::Null);

            if let Some(layers) = frame.get_mut("layers").and_then(Value::as_array_mut) {
                for layer in layers.iter_mut().filter_map(Value::as_object_mut) {
                    if layer.get("data").and_then(Value::as_str) == Some("") {
                        layer.insert("data".to_string(), Value::Null);
                    }
                }
            }
        }
    }

    Ok(data)
}
