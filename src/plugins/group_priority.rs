//! Releases only the highest priority group that has candidates.
use async_trait::async_trait;

use crate::{
    candidate::CandidateReleasePullRequest,
    config::plugin::GroupPriorityConfig,
    error::Result,
    plugins::{PluginContext, ReleasePlugin},
};

#[derive(Debug, Clone)]
pub struct GroupPriority {
    groups: Vec<String>,
}

impl GroupPriority {
    pub fn new(config: &GroupPriorityConfig) -> Self {
        Self {
            groups: config.groups.clone(),
        }
    }

    pub fn filter(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
    ) -> Vec<CandidateReleasePullRequest> {
        let selected = self.groups.iter().find(|group| {
            candidates
                .iter()
                .any(|c| c.pull_request.group.as_ref() == Some(*group))
        });

        let Some(group) = selected else {
            return candidates;
        };

        log::info!("releasing prioritized group {group} only");

        candidates
            .into_iter()
            .filter(|c| c.pull_request.group.as_ref() == Some(group))
            .collect()
    }
}

#[async_trait]
impl ReleasePlugin for GroupPriority {
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        _ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        Ok(self.filter(candidates))
    }
}
