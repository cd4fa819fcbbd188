//! Cargo workspaces: `[workspace] members` in the root Cargo.toml and a
//! shared Cargo.lock.
use semver::Version;
use serde::Deserialize;
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    config::release_type::ReleaseType,
    error::{ReleaseGraphError, Result},
    plugins::workspace::{MemberManifest, MemberPatterns, WorkspaceEcosystem},
    updater::{
        Updater,
        rust::{cargo_lock::CargoLockUpdater, cargo_toml::CargoTomlUpdater},
    },
};

#[derive(Debug, Default, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    workspace: Option<CargoWorkspaceSection>,
    #[serde(flatten)]
    dependencies: DependencySections,
    #[serde(default)]
    target: BTreeMap<String, DependencySections>,
}

#[derive(Debug, Default, Deserialize)]
struct CargoPackage {
    name: Option<String>,
    version: Option<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CargoWorkspaceSection {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    package: Option<WorkspacePackage>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspacePackage {
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DependencySections {
    #[serde(default)]
    dependencies: BTreeMap<String, CargoDependency>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, CargoDependency>,
    #[serde(default)]
    build_dependencies: BTreeMap<String, CargoDependency>,
}

impl DependencySections {
    /// Crate names, following `package = "..."` renames.
    fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .chain(self.build_dependencies.iter())
            .map(|(key, dep)| match dep {
                CargoDependency::Detailed {
                    package: Some(package),
                } => package.clone(),
                _ => key.clone(),
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CargoDependency {
    Version(#[allow(dead_code)] String),
    Detailed { package: Option<String> },
}

fn parse(path: &str, content: &str) -> Result<CargoManifest> {
    toml::from_str(content).map_err(|err| {
        log::warn!("failed to parse {path}: {err}");
        ReleaseGraphError::missing_manifest(path)
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CargoWorkspace;

impl WorkspaceEcosystem for CargoWorkspace {
    fn name(&self) -> &'static str {
        "cargo-workspace"
    }

    fn manifest_file(&self) -> &'static str {
        "Cargo.toml"
    }

    fn lock_file(&self) -> Option<&'static str> {
        Some("Cargo.lock")
    }

    fn release_type(&self) -> ReleaseType {
        ReleaseType::Rust
    }

    fn member_patterns(&self, root_content: &str) -> Result<MemberPatterns> {
        let manifest: CargoManifest = toml::from_str(root_content)?;

        let Some(workspace) = manifest.workspace else {
            return Err(ReleaseGraphError::configuration(
                "cargo-workspace plugin: Cargo.toml has no [workspace] section",
            ));
        };

        if workspace.members.is_empty() {
            return Err(ReleaseGraphError::configuration(
                "cargo-workspace plugin: [workspace] declares no members",
            ));
        }

        Ok(MemberPatterns {
            include: workspace.members,
            exclude: workspace.exclude,
        })
    }

    fn parse_member(
        &self,
        manifest_path: &str,
        content: &str,
        root_content: &str,
    ) -> Result<MemberManifest> {
        let manifest = parse(manifest_path, content)?;

        let package = manifest.package.unwrap_or_default();
        let Some(name) = package.name else {
            return Err(ReleaseGraphError::unnamed_package(manifest_path));
        };

        let inherits_version = matches!(package.version, Some(toml::Value::Table(_)));

        let version = match package.version {
            Some(toml::Value::String(version)) => Some(version),
            // `version.workspace = true`
            Some(toml::Value::Table(_)) => toml::from_str::<CargoManifest>(root_content)
                .ok()
                .and_then(|root| root.workspace)
                .and_then(|w| w.package)
                .and_then(|p| p.version),
            _ => None,
        };

        let dependencies = manifest
            .dependencies
            .names()
            .chain(manifest.target.values().flat_map(|t| t.names()))
            .collect();

        Ok(MemberManifest {
            name,
            version,
            inherits_version,
            dependencies,
        })
    }

    fn manifest_updater(
        &self,
        version: Option<Version>,
        dependencies: BTreeMap<String, Version>,
    ) -> Arc<dyn Updater> {
        Arc::new(CargoTomlUpdater {
            version,
            dependency_versions: dependencies,
            ..Default::default()
        })
    }

    fn root_updater(
        &self,
        shared_version: Option<Version>,
        dependencies: BTreeMap<String, Version>,
    ) -> Option<Arc<dyn Updater>> {
        // [workspace.package] version and [workspace.dependencies] entries
        Some(Arc::new(
            CargoTomlUpdater::default()
                .with_workspace_version(shared_version)
                .with_dependencies(dependencies),
        ))
    }

    fn lock_updater(&self, versions: BTreeMap<String, Version>) -> Arc<dyn Updater> {
        Arc::new(CargoLockUpdater::new(versions))
    }
}
