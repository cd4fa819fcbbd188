//! Turns a package's commits into a candidate release pull request.
use chrono::NaiveDate;
use log::*;
use semver::Version;
use std::sync::Arc;

use crate::{
    candidate::{CandidateReleasePullRequest, ReleasePullRequest, release_branch},
    changelog::{
        DependencyBump, NotesParams, NotesRenderer, append_dependency_notes,
        with_meta_information_stub,
    },
    config::{Config, package::PackageConfig},
    error::Result,
    path_helpers::package_path,
    pull_request::{PullRequestBody, PullRequestTitle, ReleaseData},
    updater::{Update, dispatch::ReleaseTypeUpdates},
    versioning::{ClassifiedCommit, VersionPolicy},
};

/// Builds candidates the same way for the orchestrator and for plugins that
/// need to re-create one at a different version.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    config: Arc<Config>,
    renderer: NotesRenderer,
    date: NaiveDate,
}

impl CandidateBuilder {
    pub fn new(config: Arc<Config>, date: NaiveDate) -> Result<Self> {
        let renderer = NotesRenderer::new(
            config.changelog_template.as_deref(),
            config.changelog_sections.clone(),
            config.repository_url.clone(),
        )?;

        Ok(Self {
            config,
            renderer,
            date,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Candidate for `package`, or `None` when its commits warrant no
    /// release. `version_override` skips the version decision entirely.
    pub fn build(
        &self,
        package: &PackageConfig,
        previous: Option<&Version>,
        commits: &[ClassifiedCommit],
        version_override: Option<&Version>,
    ) -> Result<Option<CandidateReleasePullRequest>> {
        let component = package.component_name();

        let (version, commits, forced) = match version_override {
            Some(version) => (version.clone(), commits.to_vec(), true),
            None => match self.configured_release_as(package, previous)? {
                Some(version) => (version, commits.to_vec(), true),
                None => {
                    let policy = VersionPolicy::for_package(&self.config, package)?;
                    let initial = package.initial_version()?;

                    let Some(decision) = policy.decide(
                        previous,
                        &initial,
                        component.as_deref(),
                        commits,
                    )?
                    else {
                        debug!(
                            "{}: no release warranted by {} commit(s)",
                            package.normalized_path(),
                            commits.len()
                        );
                        return Ok(None);
                    };

                    (decision.version, decision.commits, decision.forced)
                }
            },
        };

        let mut notes = self.renderer.render(&NotesParams {
            version: &version,
            previous_version: previous,
            component: component.as_deref(),
            commits: &commits,
            date: self.date,
        })?;

        if forced {
            notes = with_meta_information_stub(&notes);
        }

        let updates = ReleaseTypeUpdates::new(package.release_type)
            .updates(package, &version)?;

        info!(
            "{}: {} -> {version}",
            package.normalized_path(),
            previous.map(|v| v.to_string()).unwrap_or_else(|| "unreleased".into())
        );

        Ok(Some(self.assemble(package, previous, version, notes, updates)))
    }

    /// Candidate for a package released only because workspace siblings it
    /// depends on changed version.
    pub fn build_dependency_bump(
        &self,
        package: &PackageConfig,
        previous: &Version,
        version: &Version,
        bumps: &[DependencyBump],
        updates: Vec<Update>,
    ) -> Result<CandidateReleasePullRequest> {
        let heading = self.renderer.render(&NotesParams {
            version,
            previous_version: Some(previous),
            component: package.component_name().as_deref(),
            commits: &[],
            date: self.date,
        })?;

        let notes = append_dependency_notes(&heading, bumps);

        Ok(self.assemble(
            package,
            Some(previous),
            version.clone(),
            notes,
            updates,
        ))
    }

    fn configured_release_as(
        &self,
        package: &PackageConfig,
        previous: Option<&Version>,
    ) -> Result<Option<Version>> {
        let Some(raw) = package.release_as.as_ref() else {
            return Ok(None);
        };

        let version = Version::parse(raw)?;

        // already released at the asserted version
        if previous == Some(&version) {
            return Ok(None);
        }

        Ok(Some(version))
    }

    fn assemble(
        &self,
        package: &PackageConfig,
        previous: Option<&Version>,
        version: Version,
        notes: String,
        updates: Vec<Update>,
    ) -> CandidateReleasePullRequest {
        let path = package.normalized_path();
        let component = package.component_name();

        let changelog_path = if package.skip_changelog {
            None
        } else {
            Some(package_path(package, Some(package.changelog_file())))
        };

        let body = PullRequestBody::new(vec![ReleaseData {
            path: path.clone(),
            component: component.clone(),
            version: version.clone(),
            notes,
            changelog_path,
        }])
        .with_text(
            &self.config.pull_request_header,
            &self.config.pull_request_footer,
        );

        let title = PullRequestTitle::single(
            Some(&self.config.pull_request_title_pattern),
            component.as_deref(),
            &version,
            &self.config.base_branch,
        );

        CandidateReleasePullRequest {
            path,
            config: package.clone(),
            pull_request: ReleasePullRequest {
                title,
                body,
                updates,
                labels: self.config.labels.clone(),
                head_branch: release_branch(
                    &self.config.base_branch,
                    component.as_deref(),
                ),
                version: Some(version),
                previous_version: previous.cloned(),
                draft: package.draft.unwrap_or(self.config.draft),
                group: None,
            },
        }
    }
}
