//! Candidate release pull requests: the unit every plugin stage consumes
//! and produces.
use semver::Version;

use crate::{
    config::package::PackageConfig,
    pull_request::{PullRequestBody, PullRequestTitle, ReleaseData},
    updater::{Update, changelog::ChangelogUpdater, merge_updates},
};

pub mod builder;

pub use crate::manifest::VersionsMap;
pub use builder::CandidateBuilder;

/// Prefix of every release branch.
pub const BRANCH_PREFIX: &str = "release-graph";

/// Branch a single package is released from.
pub fn release_branch(base_branch: &str, component: Option<&str>) -> String {
    match component {
        Some(component) => format!("{BRANCH_PREFIX}--{base_branch}--{component}"),
        None => format!("{BRANCH_PREFIX}--{base_branch}"),
    }
}

/// A pull request that has not been submitted yet.
#[derive(Debug, Clone)]
pub struct ReleasePullRequest {
    pub title: PullRequestTitle,
    pub body: PullRequestBody,
    /// Version file updates. Changelog updates are derived from `body` when
    /// the change set is assembled, see [`ReleasePullRequest::all_updates`].
    pub updates: Vec<Update>,
    pub labels: Vec<String>,
    pub head_branch: String,
    pub version: Option<Version>,
    pub previous_version: Option<Version>,
    pub draft: bool,
    /// Shared group label assigned by version linking
    pub group: Option<String>,
}

impl ReleasePullRequest {
    /// Changelog prepends for every release section that has a changelog.
    pub fn changelog_updates(&self) -> Vec<Update> {
        self.body
            .releases
            .iter()
            .filter_map(|release| {
                release.changelog_path.as_ref().map(|path| {
                    Update::new(
                        path.clone(),
                        true,
                        ChangelogUpdater::new(release.notes.clone()),
                    )
                })
            })
            .collect()
    }

    /// Version file and changelog updates with unique paths.
    pub fn all_updates(&self) -> Vec<Update> {
        let mut updates = self.updates.clone();
        updates.extend(self.changelog_updates());
        merge_updates(updates)
    }

    pub fn release_mut(&mut self, path: &str) -> Option<&mut ReleaseData> {
        self.body.releases.iter_mut().find(|r| r.path == path)
    }
}

/// A proposed release of the package at `path`.
#[derive(Debug, Clone)]
pub struct CandidateReleasePullRequest {
    pub path: String,
    pub config: PackageConfig,
    pub pull_request: ReleasePullRequest,
}

impl CandidateReleasePullRequest {
    pub fn component(&self) -> Option<String> {
        self.config.component_name()
    }

    pub fn version(&self) -> Option<&Version> {
        self.pull_request.version.as_ref()
    }

    /// Every package path released by this candidate and its version.
    pub fn released_versions(&self) -> VersionsMap {
        self.pull_request
            .body
            .releases
            .iter()
            .map(|r| (r.path.clone(), r.version.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{candidate, replace_update};

    #[test]
    fn branch_names() {
        assert_eq!(release_branch("main", None), "release-graph--main");
        assert_eq!(
            release_branch("main", Some("core")),
            "release-graph--main--core"
        );
    }

    #[test]
    fn changelog_updates_follow_release_notes() {
        let mut candidate = candidate("path/a", "pkg1", "1.0.1");
        candidate
            .pull_request
            .updates
            .push(replace_update("path/a/CHANGELOG.md", "other"));

        let release = candidate.pull_request.release_mut("path/a").unwrap();
        release.notes = "## 1.0.1\n\n* edited".into();

        let updates = candidate.pull_request.all_updates();
        let changelog: Vec<_> = updates
            .iter()
            .filter(|u| u.path == "path/a/CHANGELOG.md")
            .collect();

        assert_eq!(changelog.len(), 1);
        let content = changelog[0].updater.update_content(None).unwrap();
        assert!(content.contains("* edited"));
    }

    #[test]
    fn released_versions_cover_every_section() {
        let candidate = candidate("path/a", "pkg1", "1.0.1");
        let versions = candidate.released_versions();
        assert_eq!(versions["path/a"], Version::new(1, 0, 1));
    }
}
