//! Serialization helpers for field tables, endpoint documentation and doc sidecars.
//!
//! Everything this crate writes out goes through these functions, so all output is
//! pretty-printed JSON or standard YAML.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a value to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use restdocs_from_source::serializer::serialize_yaml;
/// use std::collections::BTreeMap;
///
/// let mut row = BTreeMap::new();
/// row.insert("path", "name");
/// let yaml = serialize_yaml(&row).unwrap();
/// assert!(yaml.contains("path: name"));
/// ```
pub fn serialize_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing to YAML");
    serde_yaml::to_string(value).context("Failed to serialize to YAML")
}

/// Serializes a value to JSON format with pretty printing.
///
/// The output is formatted with indentation for readability, making it suitable
/// for human review and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and its parent directories if they don't exist, or overwrites the
/// file if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
