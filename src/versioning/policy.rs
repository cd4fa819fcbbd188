use log::*;
use regex::Regex;
use semver::Version;

use crate::{
    config::{Config, package::PackageConfig},
    error::Result,
    versioning::{
        commit::{ClassifiedCommit, RELEASE_AS_NOTE},
        strategy::{BumpOptions, VersionStrategy, create_strategy},
    },
};

/// Qualifier stripped from component names before comparing them with the
/// scope of a `Release-As` commit, so `foo-v2` accepts `chore(foo): ...`.
pub const DEFAULT_COMPONENT_QUALIFIER_PATTERN: &str = r"-v\d+$";

/// Outcome of a release decision for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecision {
    pub version: Version,
    /// Commits with any consumed `Release-As` notes removed
    pub commits: Vec<ClassifiedCommit>,
    /// Whether the version was asserted rather than computed
    pub forced: bool,
}

/// Computes the next version of a package from its prior version and the
/// commits made since.
#[derive(Debug)]
pub struct VersionPolicy {
    strategy: Box<dyn VersionStrategy>,
    qualifier: Regex,
}

impl VersionPolicy {
    pub fn new(strategy: Box<dyn VersionStrategy>, qualifier: Regex) -> Self {
        Self {
            strategy,
            qualifier,
        }
    }

    /// Policy for `package`, with its overrides applied over the root
    /// configuration.
    pub fn for_package(config: &Config, package: &PackageConfig) -> Result<Self> {
        let options = BumpOptions {
            bump_minor_pre_major: package
                .bump_minor_pre_major
                .unwrap_or(config.bump_minor_pre_major),
            bump_patch_for_minor_pre_major: package
                .bump_patch_for_minor_pre_major
                .unwrap_or(config.bump_patch_for_minor_pre_major),
        };

        let versioning = package.versioning.unwrap_or(config.versioning);
        let identifier = package
            .prerelease_identifier
            .as_deref()
            .or(config.prerelease_identifier.as_deref());

        let qualifier = Regex::new(
            config
                .component_qualifier_pattern
                .as_deref()
                .unwrap_or(DEFAULT_COMPONENT_QUALIFIER_PATTERN),
        )?;

        Ok(Self::new(
            create_strategy(versioning, identifier, options)?,
            qualifier,
        ))
    }

    /// Whether a `Release-As` note on a commit with `scope` targets
    /// `component`. Unscoped notes apply to every package.
    pub fn scope_matches(&self, scope: Option<&str>, component: Option<&str>) -> bool {
        let Some(scope) = scope else {
            return true;
        };
        let Some(component) = component else {
            return false;
        };

        scope == component || scope == self.qualifier.replace(component, "")
    }

    /// Decides the next version. `None` means no release is warranted and
    /// no candidate should be created.
    ///
    /// A never-released package takes `initial` when it has any commits.
    /// An applicable `Release-As` note overrides everything else and is
    /// removed from the returned commits so it is not repeated in notes.
    pub fn decide(
        &self,
        previous: Option<&Version>,
        initial: &Version,
        component: Option<&str>,
        commits: &[ClassifiedCommit],
    ) -> Result<Option<VersionDecision>> {
        let mut release_as: Option<Version> = None;
        let mut remaining = Vec::with_capacity(commits.len());

        for commit in commits.iter() {
            let applies = self.scope_matches(commit.scope.as_deref(), component);
            let mut commit = commit.clone();

            if applies {
                for note in commit.notes.iter().filter(|n| n.title == RELEASE_AS_NOTE) {
                    if release_as.is_some() {
                        continue;
                    }
                    match Version::parse(note.text.trim()) {
                        Ok(version) => release_as = Some(version),
                        Err(err) => warn!(
                            "ignoring invalid Release-As '{}' on {}: {err}",
                            note.text,
                            commit.short_sha()
                        ),
                    }
                }
                commit.notes.retain(|n| n.title != RELEASE_AS_NOTE);
            }

            remaining.push(commit);
        }

        if let Some(version) = release_as {
            info!("release-as asserts version {version}");
            return Ok(Some(VersionDecision {
                version,
                commits: remaining,
                forced: true,
            }));
        }

        let next = match previous {
            None if remaining.is_empty() => None,
            None => {
                debug!("no prior release, using initial version {initial}");
                Some(initial.clone())
            }
            Some(previous) => self.strategy.next_version(previous, &remaining)?,
        };

        Ok(next.map(|version| VersionDecision {
            version,
            commits: remaining,
            forced: false,
        }))
    }
}
