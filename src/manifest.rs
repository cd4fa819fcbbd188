//! Persisted release state: a JSON object mapping package path to the
//! version last released from it.
use semver::Version;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ReleaseGraphError, Result};

/// Package path → version, ordered by path.
pub type VersionsMap = BTreeMap<String, Version>;

/// Parses the state file. Entries that are not valid semver are an error
/// since every later bump would be computed from them.
pub fn parse_manifest(content: &str) -> Result<VersionsMap> {
    let map: Map<String, Value> = serde_json::from_str(content)?;
    let mut versions = VersionsMap::new();

    for (path, value) in map {
        let raw = value.as_str().ok_or_else(|| {
            ReleaseGraphError::InvalidPackageVersion {
                package: path.clone(),
                version: value.to_string(),
            }
        })?;

        let version = Version::parse(raw).map_err(|_| {
            ReleaseGraphError::InvalidPackageVersion {
                package: path.clone(),
                version: raw.to_string(),
            }
        })?;

        versions.insert(path, version);
    }

    Ok(versions)
}

/// Renders the state file with keys sorted and a trailing newline.
pub fn render_manifest(versions: &VersionsMap) -> Result<String> {
    let map: Map<String, Value> = versions
        .iter()
        .map(|(path, version)| (path.clone(), Value::String(version.to_string())))
        .collect();

    let mut content = serde_json::to_string_pretty(&map)?;
    content.push('\n');
    Ok(content)
}
