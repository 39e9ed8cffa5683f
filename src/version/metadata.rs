//! Structured package descriptor (`package.json`) holding a `version` field.

use crate::error::{Result, WardenError};
use serde_json::Value;
use std::path::Path;

/// Read the `version` field of a metadata file
pub fn read_version(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WardenError::MetadataError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    version_of(&contents)
}

/// Extract the `version` field from metadata content
pub fn version_of(contents: &str) -> Result<String> {
    let document: Value = serde_json::from_str(contents)?;

    document
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WardenError::MetadataError("No version field in metadata".to_string()))
}

/// Return `contents` with its `version` field set to `version`
///
/// Field order is preserved, the document is written with two-space
/// indentation and a trailing newline is kept when the input had one.
pub fn with_version(contents: &str, version: &str) -> Result<String> {
    let mut document: Value = serde_json::from_str(contents)?;

    let object = document.as_object_mut().ok_or_else(|| {
        WardenError::MetadataError("Metadata document is not a JSON object".to_string())
    })?;
    object.insert("version".to_string(), Value::String(version.to_string()));

    let mut rendered = serde_json::to_string_pretty(&document)?;
    if contents.ends_with('\n') {
        rendered.push('\n');
    }

    Ok(rendered)
}

/// Rewrite the metadata file with a new version
pub fn write_version(path: &Path, version: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        WardenError::MetadataError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let updated = with_version(&contents, version)?;

    std::fs::write(path, updated).map_err(|e| {
        WardenError::MetadataError(format!("Failed to write {}: {}", path.display(), e))
    })
}
