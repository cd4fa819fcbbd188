use semver::Version;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::{
    error::{ReleaseGraphError, Result},
    updater::traits::Updater,
};

/// Synchronizes local package versions in a package-lock.json, covering
/// both the v2+ `packages` map and the legacy v1 `dependencies` map.
#[derive(Debug, Clone)]
pub struct PackageLockUpdater {
    pub versions: BTreeMap<String, Version>,
    /// Version for the lockfile's own root package, whatever its name
    pub root_version: Option<Version>,
}

impl PackageLockUpdater {
    pub fn new(versions: BTreeMap<String, Version>) -> Self {
        Self {
            versions,
            root_version: None,
        }
    }

    pub fn for_root(version: Version) -> Self {
        Self {
            versions: BTreeMap::new(),
            root_version: Some(version),
        }
    }

    fn version_for(&self, name: Option<&str>) -> Option<String> {
        name.and_then(|n| self.versions.get(n)).map(|v| v.to_string())
    }
}

impl Updater for PackageLockUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.ok_or_else(|| {
            ReleaseGraphError::missing_manifest("package-lock.json")
        })?;

        let mut doc: Value = serde_json::from_str(content)?;

        let root_name = doc.get("name").and_then(|n| n.as_str()).map(String::from);
        let root_version = self
            .root_version
            .as_ref()
            .map(|v| v.to_string())
            .or_else(|| self.version_for(root_name.as_deref()));

        if let Some(version) = root_version.as_ref() {
            doc["version"] = json!(version);
        }

        if let Some(packages) =
            doc.get_mut("packages").and_then(|p| p.as_object_mut())
        {
            for (key, info) in packages.iter_mut() {
                // symlinked workspace entries carry no version of their own
                if info.get("link").and_then(|l| l.as_bool()) == Some(true) {
                    continue;
                }

                if key.is_empty()
                    && let Some(version) = root_version.as_ref()
                {
                    info["version"] = json!(version);
                    continue;
                }

                let name = match info.get("name").and_then(|n| n.as_str()) {
                    Some(name) => Some(name.to_string()),
                    None if key.is_empty() => root_name.clone(),
                    None => key.strip_prefix("node_modules/").map(String::from),
                };

                if let Some(version) = self.version_for(name.as_deref())
                    && info.get("resolved").is_none()
                {
                    info["version"] = json!(version);
                }
            }
        }

        if let Some(deps) =
            doc.get_mut("dependencies").and_then(|d| d.as_object_mut())
        {
            for (name, info) in deps.iter_mut() {
                if let Some(version) = self.version_for(Some(name))
                    && info.get("resolved").is_none()
                {
                    info["version"] = json!(version);
                }
            }
        }

        let mut formatted = serde_json::to_string_pretty(&doc)?;
        formatted.push('\n');
        Ok(formatted)
    }
}
