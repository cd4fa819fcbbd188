//! Version strategies. Each turns a prior version and a set of classified
//! commits into the next version, or `None` when nothing warrants a release.

use log::*;
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt::Debug;

use crate::{
    config::VersioningStrategy,
    error::{ReleaseGraphError, Result},
    versioning::commit::ClassifiedCommit,
};

/// Commit types that warrant a patch release on their own.
pub const PATCH_TYPES: [&str; 4] = ["fix", "perf", "revert", "deps"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl BumpKind {
    pub fn apply(&self, version: &Version) -> Version {
        let mut next = match self {
            BumpKind::Major => Version::new(version.major + 1, 0, 0),
            BumpKind::Minor => Version::new(version.major, version.minor + 1, 0),
            BumpKind::Patch => {
                Version::new(version.major, version.minor, version.patch + 1)
            }
        };
        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        next
    }
}

/// Pre-1.0 adjustments to the default bump rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BumpOptions {
    pub bump_minor_pre_major: bool,
    pub bump_patch_for_minor_pre_major: bool,
}

/// Bump warranted by `commits` over `version`, if any.
pub fn bump_kind(
    version: &Version,
    commits: &[ClassifiedCommit],
    options: BumpOptions,
) -> Option<BumpKind> {
    let pre_major = version.major == 0;

    if commits.iter().any(|c| c.breaking) {
        if pre_major && options.bump_minor_pre_major {
            return Some(BumpKind::Minor);
        }
        return Some(BumpKind::Major);
    }

    if commits.iter().any(|c| c.commit_type == "feat") {
        if pre_major && options.bump_patch_for_minor_pre_major {
            return Some(BumpKind::Patch);
        }
        return Some(BumpKind::Minor);
    }

    if commits
        .iter()
        .any(|c| PATCH_TYPES.contains(&c.commit_type.as_str()))
    {
        return Some(BumpKind::Patch);
    }

    None
}

pub trait VersionStrategy: Debug + Send + Sync {
    fn next_version(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<Option<Version>>;
}

/// breaking → major, feat → minor, fix/perf → patch. A prerelease with any
/// qualifying commit graduates to its stable version.
#[derive(Debug, Clone, Default)]
pub struct DefaultStrategy {
    pub options: BumpOptions,
}

impl VersionStrategy for DefaultStrategy {
    fn next_version(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<Option<Version>> {
        let Some(kind) = bump_kind(current, commits, self.options) else {
            return Ok(None);
        };

        if !current.pre.is_empty() {
            info!("graduating prerelease {current} to stable");
            return Ok(Some(graduate_prerelease(current)));
        }

        Ok(Some(kind.apply(current)))
    }
}

/// Applies the same bump whenever there is at least one commit.
#[derive(Debug, Clone)]
pub struct FixedBumpStrategy {
    pub kind: BumpKind,
}

impl VersionStrategy for FixedBumpStrategy {
    fn next_version(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<Option<Version>> {
        if commits.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.kind.apply(current)))
    }
}

/// Numbered prereleases: `1.2.0-beta.1`, `1.2.0-beta.2`, ...
#[derive(Debug, Clone)]
pub struct PrereleaseStrategy {
    pub identifier: String,
    pub options: BumpOptions,
}

impl VersionStrategy for PrereleaseStrategy {
    fn next_version(
        &self,
        current: &Version,
        commits: &[ClassifiedCommit],
    ) -> Result<Option<Version>> {
        let Some(kind) = bump_kind(current, commits, self.options) else {
            return Ok(None);
        };

        if current.pre.is_empty() {
            debug!("starting {} prerelease from {current}", self.identifier);
            return add_prerelease(kind.apply(current), &self.identifier).map(Some);
        }

        let pre = current.pre.as_str();
        let counter = pre
            .strip_prefix(&format!("{}.", self.identifier))
            .and_then(|n| n.parse::<u64>().ok());

        match counter {
            Some(n) => {
                let mut next = graduate_prerelease(current);
                next.pre = Prerelease::new(&format!("{}.{}", self.identifier, n + 1))?;
                Ok(Some(next))
            }
            None => {
                info!(
                    "switching prerelease {current} to identifier {}",
                    self.identifier
                );
                add_prerelease(graduate_prerelease(current), &self.identifier)
                    .map(Some)
            }
        }
    }
}

/// Adds `<identifier>.1` to a stable version.
pub fn add_prerelease(mut version: Version, identifier: &str) -> Result<Version> {
    version.pre = Prerelease::new(&format!("{identifier}.1"))?;
    Ok(version)
}

/// Drops prerelease and build metadata (`1.0.0-rc.2` → `1.0.0`).
pub fn graduate_prerelease(version: &Version) -> Version {
    let mut next = version.clone();
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    next
}

/// Builds the strategy selected in configuration.
pub fn create_strategy(
    versioning: VersioningStrategy,
    prerelease_identifier: Option<&str>,
    options: BumpOptions,
) -> Result<Box<dyn VersionStrategy>> {
    Ok(match versioning {
        VersioningStrategy::Default => Box::new(DefaultStrategy { options }),
        VersioningStrategy::AlwaysBumpPatch => Box::new(FixedBumpStrategy {
            kind: BumpKind::Patch,
        }),
        VersioningStrategy::AlwaysBumpMinor => Box::new(FixedBumpStrategy {
            kind: BumpKind::Minor,
        }),
        VersioningStrategy::AlwaysBumpMajor => Box::new(FixedBumpStrategy {
            kind: BumpKind::Major,
        }),
        VersioningStrategy::Prerelease => {
            let identifier = prerelease_identifier.ok_or_else(|| {
                ReleaseGraphError::configuration(
                    "prerelease versioning requires prerelease_identifier",
                )
            })?;
            Box::new(PrereleaseStrategy {
                identifier: identifier.to_string(),
                options,
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn commit(commit_type: &str) -> ClassifiedCommit {
        ClassifiedCommit::new("abc", commit_type, "change")
    }

    fn breaking() -> ClassifiedCommit {
        let mut c = commit("feat");
        c.breaking = true;
        c
    }

    #[test]
    fn default_rules() {
        let strategy = DefaultStrategy::default();

        let cases = [
            (vec![commit("fix")], "1.2.4"),
            (vec![commit("perf")], "1.2.4"),
            (vec![commit("fix"), commit("feat")], "1.3.0"),
            (vec![commit("fix"), breaking()], "2.0.0"),
        ];

        for (commits, expected) in cases {
            let next = strategy.next_version(&v("1.2.3"), &commits).unwrap();
            assert_eq!(next, Some(v(expected)));
        }
    }

    #[test]
    fn no_qualifying_commits_means_no_release() {
        let strategy = DefaultStrategy::default();
        let next = strategy
            .next_version(&v("1.2.3"), &[commit("chore"), commit("docs")])
            .unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn pre_major_options() {
        let strategy = DefaultStrategy {
            options: BumpOptions {
                bump_minor_pre_major: true,
                bump_patch_for_minor_pre_major: true,
            },
        };

        assert_eq!(
            strategy.next_version(&v("0.4.1"), &[breaking()]).unwrap(),
            Some(v("0.5.0"))
        );
        assert_eq!(
            strategy.next_version(&v("0.4.1"), &[commit("feat")]).unwrap(),
            Some(v("0.4.2"))
        );
        // options only apply below 1.0.0
        assert_eq!(
            strategy.next_version(&v("1.4.1"), &[breaking()]).unwrap(),
            Some(v("2.0.0"))
        );
    }

    #[test]
    fn default_graduates_prereleases() {
        let strategy = DefaultStrategy::default();
        assert_eq!(
            strategy.next_version(&v("2.0.0-rc.3"), &[commit("fix")]).unwrap(),
            Some(v("2.0.0"))
        );
    }

    #[test]
    fn fixed_bumps() {
        let strategy = FixedBumpStrategy {
            kind: BumpKind::Minor,
        };
        assert_eq!(
            strategy.next_version(&v("1.2.3"), &[commit("chore")]).unwrap(),
            Some(v("1.3.0"))
        );
        assert!(strategy.next_version(&v("1.2.3"), &[]).unwrap().is_none());
    }

    #[test]
    fn prerelease_counters() {
        let strategy = PrereleaseStrategy {
            identifier: "beta".into(),
            options: BumpOptions::default(),
        };

        assert_eq!(
            strategy.next_version(&v("1.2.3"), &[commit("feat")]).unwrap(),
            Some(v("1.3.0-beta.1"))
        );
        assert_eq!(
            strategy
                .next_version(&v("1.3.0-beta.1"), &[commit("fix")])
                .unwrap(),
            Some(v("1.3.0-beta.2"))
        );
        assert_eq!(
            strategy
                .next_version(&v("1.3.0-alpha.4"), &[commit("fix")])
                .unwrap(),
            Some(v("1.3.0-beta.1"))
        );
    }

    #[test]
    fn factory_requires_identifier_for_prereleases() {
        assert!(
            create_strategy(
                VersioningStrategy::Prerelease,
                None,
                BumpOptions::default()
            )
            .is_err()
        );
        assert!(
            create_strategy(
                VersioningStrategy::AlwaysBumpMajor,
                None,
                BumpOptions::default()
            )
            .is_ok()
        );
    }
}
