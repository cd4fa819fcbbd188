//! Post-processing stages over the candidate list.
//!
//! Plugins form a closed set resolved from [`PluginConfig`] at startup. Each
//! stage takes the candidate list by value and returns a new list, so the
//! orchestrator runs them as a straight pipeline.
use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::{
    candidate::{CandidateBuilder, CandidateReleasePullRequest, VersionsMap},
    checkpoint::Checkpoint,
    config::{package::PackageConfig, plugin::PluginConfig},
    error::Result,
    forge::manager::ForgeManager,
    versioning::ClassifiedCommit,
};

pub mod cargo_workspace;
pub mod group_priority;
pub mod linked_versions;
pub mod merge;
pub mod node_workspace;
pub mod sentence_case;
pub mod workspace;

pub use cargo_workspace::CargoWorkspace;
pub use group_priority::GroupPriority;
pub use linked_versions::LinkedVersions;
pub use merge::Merge;
pub use node_workspace::NodeWorkspace;
pub use sentence_case::SentenceCase;
pub use workspace::WorkspacePlugin;

/// Everything a plugin may consult while transforming candidates.
pub struct PluginContext<'a> {
    pub forge: &'a ForgeManager,
    pub builder: &'a CandidateBuilder,
    pub base_branch: &'a str,
    pub packages: &'a [PackageConfig],
    /// Last released version per package path
    pub prior_versions: &'a VersionsMap,
    /// Preprocessed commits per package path
    pub commits: &'a BTreeMap<String, Vec<ClassifiedCommit>>,
    pub checkpoint: &'a dyn Checkpoint,
}

impl PluginContext<'_> {
    pub fn package(&self, path: &str) -> Option<&PackageConfig> {
        self.packages.iter().find(|p| p.normalized_path() == path)
    }

    pub fn commits_for(&self, path: &str) -> &[ClassifiedCommit] {
        self.commits.get(path).map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait]
pub trait ReleasePlugin: Send + Sync {
    /// Rewrites commits before any version decision is made.
    fn process_commits(
        &self,
        commits: Vec<ClassifiedCommit>,
    ) -> Vec<ClassifiedCommit> {
        commits
    }

    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>>;
}

/// Static dispatch over the known plugins.
#[derive(Debug, Clone)]
pub enum Plugin {
    CargoWorkspace(WorkspacePlugin<CargoWorkspace>),
    NodeWorkspace(WorkspacePlugin<NodeWorkspace>),
    LinkedVersions(LinkedVersions),
    SentenceCase(SentenceCase),
    GroupPriority(GroupPriority),
    Merge(Merge),
}

impl Plugin {
    pub fn from_config(config: &PluginConfig) -> Self {
        match config {
            PluginConfig::CargoWorkspace(c) => {
                Plugin::CargoWorkspace(WorkspacePlugin::new(CargoWorkspace, c))
            }
            PluginConfig::NodeWorkspace(c) => {
                Plugin::NodeWorkspace(WorkspacePlugin::new(NodeWorkspace, c))
            }
            PluginConfig::LinkedVersions(c) => {
                Plugin::LinkedVersions(LinkedVersions::new(c))
            }
            PluginConfig::SentenceCase(c) => {
                Plugin::SentenceCase(SentenceCase::new(c))
            }
            PluginConfig::GroupPriority(c) => {
                Plugin::GroupPriority(GroupPriority::new(c))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plugin::CargoWorkspace(_) => "cargo-workspace",
            Plugin::NodeWorkspace(_) => "node-workspace",
            Plugin::LinkedVersions(_) => "linked-versions",
            Plugin::SentenceCase(_) => "sentence-case",
            Plugin::GroupPriority(_) => "group-priority",
            Plugin::Merge(_) => "merge",
        }
    }

    fn inner(&self) -> &dyn ReleasePlugin {
        match self {
            Plugin::CargoWorkspace(p) => p,
            Plugin::NodeWorkspace(p) => p,
            Plugin::LinkedVersions(p) => p,
            Plugin::SentenceCase(p) => p,
            Plugin::GroupPriority(p) => p,
            Plugin::Merge(p) => p,
        }
    }

    pub fn process_commits(
        &self,
        commits: Vec<ClassifiedCommit>,
    ) -> Vec<ClassifiedCommit> {
        self.inner().process_commits(commits)
    }

    pub async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        log::debug!(
            "running plugin {} over {} candidate(s)",
            self.name(),
            candidates.len()
        );
        self.inner().run(candidates, ctx).await
    }
}
