//! Combines several candidates into one pull request.
use async_trait::async_trait;

use crate::{
    candidate::{CandidateReleasePullRequest, ReleasePullRequest, release_branch},
    error::Result,
    plugins::{PluginContext, ReleasePlugin},
    pull_request::{PullRequestBody, PullRequestTitle},
    updater::{Update, merge_updates},
};

/// Merges every candidate it receives into a single candidate.
#[derive(Debug, Clone, Default)]
pub struct Merge {
    /// Head branch of the merged pull request, defaults to the shared
    /// release branch of the base branch.
    pub head_branch: Option<String>,
    /// Title pattern used when the merged releases share a group.
    pub title_pattern: Option<String>,
}

impl Merge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head_branch(mut self, head_branch: impl Into<String>) -> Self {
        self.head_branch = Some(head_branch.into());
        self
    }

    pub fn with_title_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.title_pattern = Some(pattern.into());
        self
    }

    /// Zero inputs produce nothing and a single input passes through as is.
    pub fn merge(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        base_branch: &str,
    ) -> Vec<CandidateReleasePullRequest> {
        if candidates.len() <= 1 {
            return candidates;
        }

        let head_branch = self
            .head_branch
            .clone()
            .unwrap_or_else(|| release_branch(base_branch, None));

        let version = shared(candidates.iter().map(|c| c.version())).cloned();
        let group = shared(
            candidates.iter().map(|c| c.pull_request.group.as_ref()),
        );

        let title = match (group, version.as_ref()) {
            (Some(group), Some(version)) => PullRequestTitle::single(
                self.title_pattern.as_deref(),
                Some(group.as_str()),
                version,
                base_branch,
            ),
            _ => PullRequestTitle::merged(base_branch),
        };
        let group = group.cloned();

        let first = &candidates[0];
        let mut config = first.config.clone();
        config.path = ".".into();
        config.component = group.clone();

        let header = first.pull_request.body.header.clone();
        let footer = first.pull_request.body.footer.clone();

        let mut updates: Vec<Update> = vec![];
        let mut releases = vec![];
        let mut labels: Vec<String> = vec![];
        let mut draft = false;

        for candidate in candidates.iter() {
            let pr = &candidate.pull_request;
            updates.extend(pr.updates.iter().cloned());
            releases.extend(pr.body.releases.iter().cloned());
            draft |= pr.draft;
            for label in pr.labels.iter() {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }

        log::info!(
            "merged {} candidate(s) into {head_branch}",
            candidates.len()
        );

        vec![CandidateReleasePullRequest {
            path: ".".into(),
            config,
            pull_request: ReleasePullRequest {
                title,
                body: PullRequestBody {
                    header,
                    releases,
                    footer,
                },
                updates: merge_updates(updates),
                labels,
                head_branch,
                version,
                previous_version: None,
                draft,
                group,
            },
        }]
    }
}

/// The common value when every item agrees.
fn shared<'a, T: PartialEq + Clone + 'a>(
    mut items: impl Iterator<Item = Option<&'a T>>,
) -> Option<&'a T> {
    let first = items.next()??;
    items.all(|item| item == Some(first)).then_some(first)
}

#[async_trait]
impl ReleasePlugin for Merge {
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        Ok(self.merge(candidates, ctx.base_branch))
    }
}
