use semver::Version;
use std::collections::BTreeMap;
use toml_edit::{DocumentMut, value};

use crate::{
    error::{ReleaseGraphError, Result},
    updater::traits::Updater,
};

/// Synchronizes `[[package]]` versions in a Cargo.lock for local crates.
#[derive(Debug, Clone)]
pub struct CargoLockUpdater {
    pub versions: BTreeMap<String, Version>,
}

impl CargoLockUpdater {
    pub fn new(versions: BTreeMap<String, Version>) -> Self {
        Self { versions }
    }
}

impl Updater for CargoLockUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content
            .ok_or_else(|| ReleaseGraphError::missing_manifest("Cargo.lock"))?;

        let mut doc = content.parse::<DocumentMut>()?;

        if let Some(packages) = doc
            .get_mut("package")
            .and_then(|p| p.as_array_of_tables_mut())
        {
            for package in packages.iter_mut() {
                // registry and git packages carry a source; local crates don't
                if package.contains_key("source") {
                    continue;
                }

                let Some(name) = package.get("name").and_then(|n| n.as_str())
                else {
                    continue;
                };

                if let Some(version) = self.versions.get(name) {
                    package["version"] = value(version.to_string());
                }
            }
        }

        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCK: &str = r#"# This file is automatically @generated by Cargo.
version = 4

[[package]]
name = "app"
version = "1.0.0"
dependencies = [
 "core",
]

[[package]]
name = "core"
version = "0.1.0"

[[package]]
name = "core"
version = "0.1.0"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

    #[test]
    fn updates_local_packages_only() {
        let versions = BTreeMap::from([
            ("core".to_string(), Version::new(0, 2, 0)),
            ("app".to_string(), Version::new(1, 0, 1)),
        ]);

        let result = CargoLockUpdater::new(versions)
            .update_content(Some(LOCK))
            .unwrap();

        let doc = result.parse::<DocumentMut>().unwrap();
        let packages = doc["package"].as_array_of_tables().unwrap();
        let versions: Vec<&str> = packages
            .iter()
            .map(|p| p["version"].as_str().unwrap())
            .collect();

        assert_eq!(versions, vec!["1.0.1", "0.2.0", "0.1.0"]);
        assert!(result.starts_with("# This file is automatically @generated"));
    }

    #[test]
    fn unknown_packages_are_untouched() {
        let result = CargoLockUpdater::new(BTreeMap::new())
            .update_content(Some(LOCK))
            .unwrap();
        assert_eq!(result, LOCK);
    }
}
