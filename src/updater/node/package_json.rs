use semver::Version;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::{
    error::{ReleaseGraphError, Result},
    updater::{
        node::{DEPENDENCY_KINDS, replace_range},
        traits::Updater,
    },
};

/// Rewrites `version` and sibling dependency ranges in a package.json.
/// Key order is preserved.
#[derive(Debug, Clone, Default)]
pub struct PackageJsonUpdater {
    pub version: Option<Version>,
    pub dependency_versions: BTreeMap<String, Version>,
}

impl PackageJsonUpdater {
    pub fn new(version: Version) -> Self {
        Self {
            version: Some(version),
            dependency_versions: BTreeMap::new(),
        }
    }

    pub fn with_dependencies(
        mut self,
        dependency_versions: BTreeMap<String, Version>,
    ) -> Self {
        self.dependency_versions = dependency_versions;
        self
    }

    fn update_deps(&self, doc: &mut Value, kind: &str) {
        let Some(deps) = doc.get_mut(kind).and_then(|d| d.as_object_mut())
        else {
            return;
        };

        for (name, range) in deps.iter_mut() {
            let Some(next) = self.dependency_versions.get(name) else {
                continue;
            };

            if let Some(updated) =
                range.as_str().and_then(|r| replace_range(r, next))
            {
                *range = json!(updated);
            }
        }
    }
}

impl Updater for PackageJsonUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.ok_or_else(|| {
            ReleaseGraphError::missing_manifest("package.json")
        })?;

        let mut doc: Value = serde_json::from_str(content)?;

        if let Some(version) = self.version.as_ref() {
            log::debug!("setting package.json version to {version}");
            doc["version"] = json!(version.to_string());
        }

        for kind in DEPENDENCY_KINDS {
            self.update_deps(&mut doc, kind);
        }

        let mut formatted = serde_json::to_string_pretty(&doc)?;
        formatted.push('\n');
        Ok(formatted)
    }
}
