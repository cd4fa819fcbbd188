//! Default file updates for each release type.

use semver::Version;
use std::collections::BTreeMap;

use crate::{
    config::{package::PackageConfig, release_type::ReleaseType},
    error::Result,
    path_helpers::package_path,
    updater::{
        generic::{GenericUpdater, VersionFileUpdater},
        node::{PackageJsonUpdater, PackageLockUpdater},
        rust::{CargoLockUpdater, CargoTomlUpdater},
        traits::Update,
    },
};

/// Release-type specific producer of version file updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTypeUpdates {
    /// Only configured extra files
    Generic,
    /// `version.txt`
    Simple,
    /// Cargo.toml and Cargo.lock
    Rust,
    /// package.json and package-lock.json
    Node,
}

impl ReleaseTypeUpdates {
    pub fn new(release_type: ReleaseType) -> Self {
        match release_type {
            ReleaseType::Generic => ReleaseTypeUpdates::Generic,
            ReleaseType::Simple => ReleaseTypeUpdates::Simple,
            ReleaseType::Rust => ReleaseTypeUpdates::Rust,
            ReleaseType::Node => ReleaseTypeUpdates::Node,
        }
    }

    /// Updates that write `version` into the package's version files. The
    /// changelog is not included; it is rendered from the release notes
    /// when the pull request is submitted.
    pub fn updates(
        &self,
        package: &PackageConfig,
        version: &Version,
    ) -> Result<Vec<Update>> {
        let mut updates = match self {
            ReleaseTypeUpdates::Generic => vec![],
            ReleaseTypeUpdates::Simple => vec![Update::new(
                package_path(package, Some("version.txt")),
                true,
                VersionFileUpdater::new(version.clone()),
            )],
            ReleaseTypeUpdates::Rust => rust_updates(package, version),
            ReleaseTypeUpdates::Node => node_updates(package, version),
        };

        for extra in package.extra_files.iter() {
            updates.push(Update::new(
                package_path(package, Some(extra.path())),
                false,
                GenericUpdater::with_regex(version.clone(), extra.compile()?),
            ));
        }

        Ok(updates)
    }
}

fn rust_updates(package: &PackageConfig, version: &Version) -> Vec<Update> {
    let mut updates = vec![Update::new(
        package_path(package, Some("Cargo.toml")),
        false,
        CargoTomlUpdater::new(version.clone()),
    )];

    match package.manifest_name() {
        Some(name) => updates.push(Update::new(
            package_path(package, Some("Cargo.lock")),
            false,
            CargoLockUpdater::new(BTreeMap::from([(name, version.clone())])),
        )),
        None => log::debug!(
            "no crate name for {}: skipping Cargo.lock",
            package.normalized_path()
        ),
    }

    updates
}

fn node_updates(package: &PackageConfig, version: &Version) -> Vec<Update> {
    vec![
        Update::new(
            package_path(package, Some("package.json")),
            false,
            PackageJsonUpdater::new(version.clone()),
        ),
        Update::new(
            package_path(package, Some("package-lock.json")),
            false,
            PackageLockUpdater::for_root(version.clone()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::package::{ExtraFileSpec, PackageConfigBuilder};

    fn paths(updates: &[Update]) -> Vec<&str> {
        updates.iter().map(|u| u.path.as_str()).collect()
    }

    #[test]
    fn rust_packages_update_manifest_and_lock() {
        let package = PackageConfigBuilder::default()
            .path("crates/core")
            .release_type(ReleaseType::Rust)
            .build()
            .unwrap();

        let updates = ReleaseTypeUpdates::new(package.release_type)
            .updates(&package, &Version::new(1, 0, 0))
            .unwrap();

        assert_eq!(
            paths(&updates),
            vec!["crates/core/Cargo.toml", "crates/core/Cargo.lock"]
        );
    }

    #[test]
    fn simple_packages_create_version_txt() {
        let package = PackageConfigBuilder::default()
            .release_type(ReleaseType::Simple)
            .extra_files(vec![ExtraFileSpec::Path("README.md".into())])
            .build()
            .unwrap();

        let updates = ReleaseTypeUpdates::new(package.release_type)
            .updates(&package, &Version::new(1, 0, 0))
            .unwrap();

        assert_eq!(paths(&updates), vec!["version.txt", "README.md"]);
        assert!(updates[0].create_if_missing);
        assert!(!updates[1].create_if_missing);
        assert_eq!(
            updates[0].updater.update_content(None).unwrap(),
            "1.0.0\n"
        );
    }

    #[test]
    fn node_packages_update_package_json_and_lock() {
        let package = PackageConfigBuilder::default()
            .path("packages/web")
            .release_type(ReleaseType::Node)
            .build()
            .unwrap();

        let updates = ReleaseTypeUpdates::new(package.release_type)
            .updates(&package, &Version::new(2, 0, 0))
            .unwrap();

        assert_eq!(
            paths(&updates),
            vec!["packages/web/package.json", "packages/web/package-lock.json"]
        );
    }
}
