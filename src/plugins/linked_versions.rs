//! Keeps a group of components on one shared version.
use async_trait::async_trait;
use semver::Version;
use std::collections::HashSet;

use crate::{
    candidate::{BRANCH_PREFIX, CandidateReleasePullRequest},
    config::plugin::LinkedVersionsConfig,
    error::Result,
    plugins::{PluginContext, ReleasePlugin, merge::Merge},
};

#[derive(Debug, Clone)]
pub struct LinkedVersions {
    group_name: String,
    components: HashSet<String>,
    merge: bool,
}

impl LinkedVersions {
    pub fn new(config: &LinkedVersionsConfig) -> Self {
        Self {
            group_name: config.group_name.clone(),
            components: config.components.iter().cloned().collect(),
            merge: config.merge,
        }
    }

    fn in_group(&self, candidate: &CandidateReleasePullRequest) -> bool {
        candidate
            .component()
            .is_some_and(|c| self.components.contains(&c))
    }

    fn group_branch(&self, base_branch: &str) -> String {
        format!("{BRANCH_PREFIX}--{base_branch}--groups--{}", self.group_name)
    }

    /// Highest version any configured member has already released.
    fn floor<'a>(&self, ctx: &'a PluginContext<'_>) -> Option<&'a Version> {
        ctx.packages
            .iter()
            .filter(|p| {
                p.component_name()
                    .is_some_and(|c| self.components.contains(&c))
            })
            .filter_map(|p| ctx.prior_versions.get(&p.normalized_path()))
            .max()
    }

    /// Shared version for this run. A candidate that would not clear the
    /// group's highest release is re-decided on top of it, so no member is
    /// ever moved backwards.
    fn group_version(
        &self,
        candidates: &[CandidateReleasePullRequest],
        ctx: &PluginContext<'_>,
    ) -> Result<Option<Version>> {
        let floor = self.floor(ctx);
        let mut version: Option<Version> = None;

        for candidate in candidates.iter().filter(|c| self.in_group(c)) {
            let Some(mut next) = candidate.version().cloned() else {
                continue;
            };

            if let Some(floor) = floor
                && next <= *floor
                && let Some(rebuilt) = ctx.builder.build(
                    &candidate.config,
                    Some(floor),
                    ctx.commits_for(&candidate.path),
                    None,
                )?
                && let Some(raised) = rebuilt.version()
            {
                log::debug!(
                    "{}: {next} does not clear {floor}, using {raised}",
                    candidate.path
                );
                next = raised.clone();
            }

            if version.as_ref().is_none_or(|v| next > *v) {
                version = Some(next);
            }
        }

        Ok(version)
    }
}

#[async_trait]
impl ReleasePlugin for LinkedVersions {
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let Some(version) = self.group_version(&candidates, ctx)? else {
            log::debug!("group {}: nothing to release", self.group_name);
            return Ok(candidates);
        };

        log::info!("group {}: linking releases at {version}", self.group_name);

        let mut grouped = vec![];
        let mut others = vec![];

        // every configured member is rebuilt, including ones without a
        // candidate of their own
        for package in ctx.packages.iter() {
            let Some(component) = package.component_name() else {
                continue;
            };
            if !self.components.contains(&component) {
                continue;
            }

            let path = package.normalized_path();
            let previous = ctx.prior_versions.get(&path);
            if let Some(previous) = previous
                && *previous >= version
            {
                log::debug!("{path}: already released at {previous}");
                continue;
            }

            let rebuilt = ctx.builder.build(
                package,
                previous,
                ctx.commits_for(&path),
                Some(&version),
            )?;

            if let Some(mut candidate) = rebuilt {
                candidate.pull_request.group = Some(self.group_name.clone());
                grouped.push(candidate);
            }
        }

        let mut position = None;
        for candidate in candidates {
            if self.in_group(&candidate) {
                position.get_or_insert(others.len());
            } else {
                others.push(candidate);
            }
        }

        ctx.checkpoint.success(&format!(
            "linked {} component(s) in {} at {version}",
            grouped.len(),
            self.group_name
        ));

        if self.merge {
            grouped = Merge::new()
                .with_head_branch(self.group_branch(ctx.base_branch))
                .with_title_pattern(
                    ctx.builder.config().pull_request_title_pattern.clone(),
                )
                .merge(grouped, ctx.base_branch);
        }

        // grouped candidates take the slot of the first group member
        let at = position.unwrap_or(others.len());
        let tail = others.split_off(at);
        others.extend(grouped);
        others.extend(tail);

        Ok(others)
    }
}
