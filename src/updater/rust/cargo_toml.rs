use semver::Version;
use std::collections::BTreeMap;
use toml_edit::{DocumentMut, Item, TableLike, value};

use crate::{
    error::{ReleaseGraphError, Result},
    updater::{rust::DEPENDENCY_KINDS, traits::Updater},
};

/// Rewrites `[package].version` and the version requirement of any listed
/// sibling crates, leaving formatting and comments untouched.
#[derive(Debug, Clone, Default)]
pub struct CargoTomlUpdater {
    /// New package version. `None` only rewrites dependency entries, as for
    /// a virtual workspace manifest.
    pub version: Option<Version>,
    /// Crate name → version to write into dependency requirements
    pub dependency_versions: BTreeMap<String, Version>,
    /// `[workspace.package].version`, inherited by members declaring
    /// `version.workspace = true`
    pub workspace_version: Option<Version>,
}

impl CargoTomlUpdater {
    pub fn new(version: Version) -> Self {
        Self {
            version: Some(version),
            ..Default::default()
        }
    }

    pub fn with_workspace_version(mut self, version: Option<Version>) -> Self {
        self.workspace_version = version;
        self
    }

    pub fn with_dependencies(
        mut self,
        dependency_versions: BTreeMap<String, Version>,
    ) -> Self {
        self.dependency_versions = dependency_versions;
        self
    }

    fn update_dependency_table(&self, table: &mut dyn TableLike) {
        for (key, item) in table.iter_mut() {
            // `foo = { package = "real-name", ... }` renames the dependency
            let name = item
                .as_table_like()
                .and_then(|t| t.get("package"))
                .and_then(|p| p.as_str())
                .unwrap_or(key.get())
                .to_string();

            let Some(next) = self.dependency_versions.get(&name) else {
                continue;
            };

            if item.is_str() {
                *item = value(next.to_string());
            } else if let Some(dep) = item.as_table_like_mut()
                && dep.contains_key("version")
            {
                dep.insert("version", value(next.to_string()));
            }
        }
    }

    fn update_dependency_kinds(&self, table: &mut dyn TableLike) {
        for kind in DEPENDENCY_KINDS {
            if let Some(deps) =
                table.get_mut(kind).and_then(Item::as_table_like_mut)
            {
                self.update_dependency_table(deps);
            }
        }
    }
}

impl Updater for CargoTomlUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content
            .ok_or_else(|| ReleaseGraphError::missing_manifest("Cargo.toml"))?;

        let mut doc = content.parse::<DocumentMut>()?;

        if let Some(version) = self.version.as_ref()
            && let Some(package) =
                doc.get_mut("package").and_then(Item::as_table_like_mut)
        {
            // `version.workspace = true` inherits from the workspace root
            let inherited = package
                .get("version")
                .map(|v| v.is_table_like())
                .unwrap_or(false);

            if !inherited {
                log::debug!("setting Cargo.toml version to {version}");
                package.insert("version", value(version.to_string()));
            }
        }

        self.update_dependency_kinds(doc.as_table_mut());

        if let Some(targets) =
            doc.get_mut("target").and_then(Item::as_table_like_mut)
        {
            for (_, target) in targets.iter_mut() {
                if let Some(target) = target.as_table_like_mut() {
                    self.update_dependency_kinds(target);
                }
            }
        }

        if let Some(version) = self.workspace_version.as_ref()
            && let Some(package) = doc
                .get_mut("workspace")
                .and_then(Item::as_table_like_mut)
                .and_then(|w| w.get_mut("package"))
                .and_then(Item::as_table_like_mut)
            && package.contains_key("version")
        {
            log::debug!("setting [workspace.package] version to {version}");
            package.insert("version", value(version.to_string()));
        }

        if let Some(workspace_deps) = doc
            .get_mut("workspace")
            .and_then(Item::as_table_like_mut)
            .and_then(|w| w.get_mut("dependencies"))
            .and_then(Item::as_table_like_mut)
        {
            self.update_dependency_table(workspace_deps);
        }

        Ok(doc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn deps(entries: &[(&str, &str)]) -> BTreeMap<String, Version> {
        entries
            .iter()
            .map(|(name, version)| (name.to_string(), v(version)))
            .collect()
    }

    #[test]
    fn updates_package_version_preserving_comments() {
        let content = r#"[package]
name = "core" # the core crate
version = "0.1.0"
edition = "2024"
"#;

        let result = CargoTomlUpdater::new(v("0.2.0"))
            .update_content(Some(content))
            .unwrap();

        assert!(result.contains(r#"version = "0.2.0""#));
        assert!(result.contains("# the core crate"));
    }

    #[test]
    fn updates_string_and_table_dependencies() {
        let content = r#"[package]
name = "app"
version = "1.0.0"

[dependencies]
core = "0.1.0"
serde = "1.0"
utils = { path = "../utils", version = "0.3.0" }
local-only = { path = "../local-only" }

[dev-dependencies.testkit]
path = "../testkit"
version = "0.1.0"
"#;

        let updater = CargoTomlUpdater::new(v("1.0.1")).with_dependencies(
            deps(&[
                ("core", "0.2.0"),
                ("utils", "0.3.1"),
                ("local-only", "9.9.9"),
                ("testkit", "0.1.1"),
            ]),
        );

        let result = updater.update_content(Some(content)).unwrap();
        let doc = result.parse::<DocumentMut>().unwrap();

        assert_eq!(doc["package"]["version"].as_str(), Some("1.0.1"));
        assert_eq!(doc["dependencies"]["core"].as_str(), Some("0.2.0"));
        assert_eq!(doc["dependencies"]["serde"].as_str(), Some("1.0"));
        assert_eq!(
            doc["dependencies"]["utils"]["version"].as_str(),
            Some("0.3.1")
        );
        assert!(doc["dependencies"]["local-only"].get("version").is_none());
        assert_eq!(
            doc["dev-dependencies"]["testkit"]["version"].as_str(),
            Some("0.1.1")
        );
    }

    #[test]
    fn follows_renamed_and_target_dependencies() {
        let content = r#"[package]
name = "app"
version = "1.0.0"

[dependencies]
short = { package = "long-name", version = "1.0.0" }

[target.'cfg(unix)'.dependencies]
core = "0.1.0"
"#;

        let updater = CargoTomlUpdater::new(v("1.0.1"))
            .with_dependencies(deps(&[("long-name", "2.0.0"), ("core", "0.2.0")]));

        let result = updater.update_content(Some(content)).unwrap();
        let doc = result.parse::<DocumentMut>().unwrap();

        assert_eq!(
            doc["dependencies"]["short"]["version"].as_str(),
            Some("2.0.0")
        );
        assert_eq!(
            doc["target"]["cfg(unix)"]["dependencies"]["core"].as_str(),
            Some("0.2.0")
        );
    }

    #[test]
    fn leaves_inherited_version_alone() {
        let content = r#"[package]
name = "member"
version.workspace = true
"#;

        let result = CargoTomlUpdater::new(v("3.0.0"))
            .update_content(Some(content))
            .unwrap();

        assert!(result.contains("version.workspace = true"));
        assert!(!result.contains("3.0.0"));
    }

    #[test]
    fn updates_workspace_dependencies_without_package() {
        let content = r#"[workspace]
members = ["crates/*"]

[workspace.dependencies]
core = { path = "crates/core", version = "0.1.0" }
"#;

        let updater = CargoTomlUpdater::default()
            .with_dependencies(deps(&[("core", "0.2.0")]));

        let result = updater.update_content(Some(content)).unwrap();

        assert!(result.contains(r#"version = "0.2.0""#));
        assert!(result.contains(r#"members = ["crates/*"]"#));
    }

    #[test]
    fn updates_shared_workspace_version() {
        let content = r#"[workspace]
members = ["crates/*"]

[workspace.package]
version = "2.0.0" # shared
edition = "2024"
"#;

        let result = CargoTomlUpdater::default()
            .with_workspace_version(Some(v("2.0.1")))
            .update_content(Some(content))
            .unwrap();
        let doc = result.parse::<DocumentMut>().unwrap();

        assert_eq!(doc["workspace"]["package"]["version"].as_str(), Some("2.0.1"));
        assert_eq!(doc["workspace"]["package"]["edition"].as_str(), Some("2024"));
        assert!(result.contains("# shared"));
    }

    #[test]
    fn missing_content_is_an_error() {
        let result = CargoTomlUpdater::new(v("1.0.0")).update_content(None);
        assert!(matches!(
            result,
            Err(ReleaseGraphError::MissingManifest { .. })
        ));
    }
}
