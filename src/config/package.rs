use derive_builder::Builder;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::{VersioningStrategy, release_type::ReleaseType},
    error::Result,
    path_helpers::normalize_path,
    updater::generic::GENERIC_VERSION_REGEX_PATTERN,
};

pub const DEFAULT_CHANGELOG_PATH: &str = "CHANGELOG.md";

/// Extra file whose version string is rewritten on release. Accepts either a
/// bare path or a table with a custom regex.
///
/// ```toml
/// extra_files = ["VERSION", { path = "src/meta.txt", version_regex = "v(?<version>\\S+)" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraFileSpec {
    Path(String),
    Full {
        path: String,
        version_regex: Option<String>,
    },
}

impl ExtraFileSpec {
    pub fn path(&self) -> &str {
        match self {
            ExtraFileSpec::Path(path) => path,
            ExtraFileSpec::Full { path, .. } => path,
        }
    }

    /// Regex used to locate the version, defaulting to the generic pattern.
    pub fn compile(&self) -> Result<Regex> {
        let pattern = match self {
            ExtraFileSpec::Full {
                version_regex: Some(pattern),
                ..
            } => pattern.as_str(),
            _ => GENERIC_VERSION_REGEX_PATTERN,
        };
        Ok(Regex::new(pattern)?)
    }
}

/// Per-package configuration. Unset options inherit the root [`Config`].
///
/// [`Config`]: crate::config::Config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(setter(into, strip_option), default)]
pub struct PackageConfig {
    /// Package directory relative to the repository root
    pub path: String,
    /// Component name used in titles, branch names and Release-As scopes
    pub component: Option<String>,
    /// Name declared in the package manifest when it differs from component
    pub package_name: Option<String>,
    pub release_type: ReleaseType,
    /// Changelog location relative to the package path
    pub changelog_path: Option<String>,
    /// Version used for a package with no prior release
    pub initial_version: Option<String>,
    /// Forces the next release to this exact version
    pub release_as: Option<String>,
    pub draft: Option<bool>,
    pub versioning: Option<VersioningStrategy>,
    pub prerelease_identifier: Option<String>,
    pub bump_minor_pre_major: Option<bool>,
    pub bump_patch_for_minor_pre_major: Option<bool>,
    /// Do not write a changelog entry for this package
    pub skip_changelog: bool,
    /// Additional files, relative to the package path, whose version is
    /// rewritten with the generic updater
    pub extra_files: Vec<ExtraFileSpec>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            path: ".".into(),
            component: None,
            package_name: None,
            release_type: ReleaseType::default(),
            changelog_path: None,
            initial_version: None,
            release_as: None,
            draft: None,
            versioning: None,
            prerelease_identifier: None,
            bump_minor_pre_major: None,
            bump_patch_for_minor_pre_major: None,
            skip_changelog: false,
            extra_files: vec![],
        }
    }
}

impl PackageConfig {
    /// Path normalized to the form used as a key in versions maps.
    pub fn normalized_path(&self) -> String {
        let path = normalize_path(&self.path);
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            ".".into()
        } else {
            path.to_string()
        }
    }

    /// Explicit component, else the final path segment. The root package
    /// has no component unless one is configured.
    pub fn component_name(&self) -> Option<String> {
        if let Some(component) = self.component.as_ref() {
            return Some(component.clone());
        }

        let path = self.normalized_path();
        if path == "." {
            return None;
        }

        path.rsplit('/').next().map(|s| s.to_string())
    }

    /// Name used to match the package against workspace manifests.
    pub fn manifest_name(&self) -> Option<String> {
        self.package_name.clone().or_else(|| self.component_name())
    }

    pub fn changelog_file(&self) -> &str {
        self.changelog_path.as_deref().unwrap_or(DEFAULT_CHANGELOG_PATH)
    }

    pub fn initial_version(&self) -> Result<semver::Version> {
        match self.initial_version.as_ref() {
            Some(version) => Ok(semver::Version::parse(version)?),
            None => Ok(self.release_type.default_initial_version()),
        }
    }
}
