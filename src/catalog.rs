//! Catalog artifact: one JSON array written once per run

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::types::{UniversityRecord, RECORD_KEYS};

/// Sibling temp file the catalog is staged in before the rename
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "catalog.json".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Write all records as an indented JSON array, replacing whatever was there.
///
/// The file is staged next to the target and renamed into place, so readers
/// see either the old catalog or the new one.
pub fn write_catalog(path: &Path, records: &[UniversityRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
    }

    let mut json = serde_json::to_string_pretty(records).context("Failed to serialize catalog")?;
    json.push('\n');

    let staging = staging_path(path);
    fs::write(&staging, json)
        .with_context(|| format!("Failed to write: {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("Failed to move catalog into place: {}", path.display()))?;
    Ok(())
}

/// Check an artifact against what the front-end expects: a non-empty array
/// of objects with exactly the seven record keys, `image` and `description`
/// being absolute URLs. Returns the element count.
pub fn verify_catalog(path: &Path) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Catalog is not valid JSON: {}", path.display()))?;

    let Value::Array(items) = value else {
        bail!("Catalog is not a JSON array");
    };
    if items.is_empty() {
        bail!("Catalog is empty");
    }

    let expected: BTreeSet<&str> = RECORD_KEYS.into_iter().collect();
    for (i, item) in items.iter().enumerate() {
        let Value::Object(map) = item else {
            bail!("Element {} is not an object", i);
        };
        let keys: BTreeSet<&str> = map.keys().map(String::as_str).collect();
        if keys != expected {
            bail!(
                "Element {} has keys {:?}, expected {:?}",
                i,
                keys,
                expected
            );
        }
        for key in ["image", "description"] {
            let url = map.get(key).and_then(Value::as_str).unwrap_or_default();
            if Url::parse(url).is_err() {
                bail!("Element {} has invalid {}: {:?}", i, key, url);
            }
        }
    }

    Ok(items.len())
}
