//! Project document load/save.
//!
//! The whole `ProjectState` is written as one JSON document with a
//! `schemaVersion` field and the `.animate` extension.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AnimateError, Result};
use crate::state::migration::{migrate_project, CURRENT_SCHEMA_VERSION};
use crate::state::project::ProjectState;

/// File extension for saved projects.
pub const PROJECT_EXTENSION: &str = "animate";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocument<S> {
    schema_version: String,

    #[serde(flatten)]
    state: S,
}

/// Serialize a project to its document form.
pub fn to_json(state: &ProjectState) -> Result<String> {
    let doc = ProjectDocument {
        schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        state,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Parse a project document, migrating older schema versions and
/// validating the result.
pub fn from_json(content: &str) -> Result<ProjectState> {
    let data: serde_json::Value = serde_json::from_str(content)?;
    let data = migrate_project(data)?;
    let doc: ProjectDocument<ProjectState> = serde_json::from_value(data)?;
    doc.state.validate()?;
    Ok(doc.state)
}

/// Default download name: `project-<unix millis>.animate`.
pub fn default_file_name() -> String {
    format!("project-{}.{}", Utc::now().timestamp_millis(), PROJECT_EXTENSION)
}

/// Write the project document to `path`.
pub fn save_project(state: &ProjectState, path: &Path) -> Result<()> {
    let content = to_json(state)?;
    fs::write(path, content).map_err(|e| AnimateError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::info!("Saved project to {}", path.display());
    Ok(())
}

/// Save into `dir` under a generated timestamped file name.
pub fn save_project_in(state: &ProjectState, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(default_file_name());
    save_project(state, &path)?;
    Ok(path)
}

/// Read and validate a project document from `path`.
pub fn load_project(path: &Path) -> Result<ProjectState> {
    if !path.exists() {
        return Err(AnimateError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| AnimateError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let state = from_json(&content)?;
    log::info!(
        "Loaded project {} ({} frames)",
        path.display(),
        state.frame_count()
    );
    Ok(state)
}
