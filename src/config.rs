//! Configuration loading and parsing for `release-graph.toml` files.
//!
//! Supports multi-package repositories, per-package overrides, versioning
//! strategies and an ordered list of plugins.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ReleaseGraphError, Result};

pub mod changelog;
pub mod package;
pub mod plugin;
pub mod release_type;

pub use changelog::ChangelogSection;
pub use package::PackageConfig;
pub use plugin::PluginConfig;
pub use release_type::ReleaseType;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "release-graph.toml";
/// Default persisted state file mapping package path to released version.
pub const DEFAULT_MANIFEST_FILE: &str = ".release-graph-manifest.json";
/// Default ceiling for a rendered pull request body, in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 65_536;
/// Label applied to release pull requests while waiting for merge.
pub const PENDING_LABEL: &str = "autorelease: pending";
pub const DEFAULT_TITLE_PATTERN: &str =
    "chore${scope}: release${component} ${version}";
pub const DEFAULT_PR_HEADER: &str =
    ":robot: I have created a release *beep* *boop*";
pub const DEFAULT_PR_FOOTER: &str =
    "This PR was generated with release-graph.";

/// How the next version is derived from classified commits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersioningStrategy {
    /// Breaking → major, feat → minor, fix/perf → patch
    #[default]
    Default,
    AlwaysBumpPatch,
    AlwaysBumpMinor,
    AlwaysBumpMajor,
    /// Bumps a numbered prerelease counter (e.g. `1.2.0-beta.3`)
    Prerelease,
}

/// Root configuration structure for `release-graph.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Branch release pull requests target
    pub base_branch: String,
    /// Open one pull request per package instead of a combined one
    pub separate_pull_requests: bool,
    /// Open release pull requests as drafts
    pub draft: bool,
    /// Labels added to every release pull request
    pub labels: Vec<String>,
    pub versioning: VersioningStrategy,
    /// Identifier used by the prerelease versioning strategy
    pub prerelease_identifier: Option<String>,
    /// Treat breaking changes as minor bumps while major is 0
    pub bump_minor_pre_major: bool,
    /// Treat features as patch bumps while major is 0
    pub bump_patch_for_minor_pre_major: bool,
    pub pull_request_title_pattern: String,
    pub pull_request_header: String,
    pub pull_request_footer: String,
    pub changelog_sections: Vec<ChangelogSection>,
    /// Overrides the tera template used to render release notes
    pub changelog_template: Option<String>,
    /// Largest pull request body, in bytes, before it is externalized
    pub max_body_size: usize,
    /// Web URL of the repository used for compare and overflow links
    pub repository_url: Option<String>,
    /// Regex stripped from component names before matching commit scopes
    /// of Release-As notes (e.g. `-v\d+$` so `foo-v2` matches scope `foo`)
    pub component_qualifier_pattern: Option<String>,
    /// Persisted state file written with every release pull request
    pub manifest_file: String,
    #[serde(rename = "package")]
    pub packages: Vec<PackageConfig>,
    #[serde(rename = "plugin")]
    pub plugins: Vec<PluginConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_branch: "main".into(),
            separate_pull_requests: false,
            draft: false,
            labels: vec![PENDING_LABEL.into()],
            versioning: VersioningStrategy::default(),
            prerelease_identifier: None,
            bump_minor_pre_major: false,
            bump_patch_for_minor_pre_major: false,
            pull_request_title_pattern: DEFAULT_TITLE_PATTERN.into(),
            pull_request_header: DEFAULT_PR_HEADER.into(),
            pull_request_footer: DEFAULT_PR_FOOTER.into(),
            changelog_sections: changelog::default_sections(),
            changelog_template: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            repository_url: None,
            component_qualifier_pattern: None,
            manifest_file: DEFAULT_MANIFEST_FILE.into(),
            packages: vec![PackageConfig::default()],
            plugins: vec![],
        }
    }
}

impl Config {
    /// Parses and validates a TOML configuration document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot act on.
    pub fn validate(&self) -> Result<()> {
        if self.packages.is_empty() {
            return Err(ReleaseGraphError::configuration(
                "at least one [[package]] must be configured",
            ));
        }

        let mut seen = HashSet::new();
        for package in self.packages.iter() {
            if !seen.insert(package.normalized_path()) {
                return Err(ReleaseGraphError::configuration(format!(
                    "duplicate package path: {}",
                    package.path
                )));
            }
        }

        if self.versioning == VersioningStrategy::Prerelease
            && self.prerelease_identifier.is_none()
        {
            return Err(ReleaseGraphError::configuration(
                "prerelease versioning requires prerelease_identifier",
            ));
        }

        if let Some(pattern) = self.component_qualifier_pattern.as_ref() {
            regex::Regex::new(pattern)?;
        }

        for plugin in self.plugins.iter() {
            plugin.validate()?;
        }

        Ok(())
    }

    pub fn package(&self, path: &str) -> Option<&PackageConfig> {
        self.packages
            .iter()
            .find(|p| p.normalized_path() == path)
    }
}
