//! Common test helper functions shared across test modules.
//!
//! This module provides fixture constructors, an in-memory forge, and a
//! harness for running a single plugin stage.
use async_trait::async_trait;
use chrono::NaiveDate;
use semver::Version;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
};

use crate::{
    candidate::{CandidateBuilder, CandidateReleasePullRequest, VersionsMap},
    checkpoint::RecordingCheckpoint,
    config::{Config, package::PackageConfigBuilder, release_type::ReleaseType},
    error::{ReleaseGraphError, Result},
    forge::{
        manager::ForgeManager,
        request::{
            CreateBranchRequest, CreatePrRequest, PullRequest,
            PullRequestHandle, ReadFileRequest,
        },
        traits::Forge,
    },
    orchestrator::materialize,
    plugins::{PluginContext, ReleasePlugin},
    updater::{Update, Updater},
    versioning::ClassifiedCommit,
};

/// Fixed release date so rendered notes are stable.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

/// A conventional commit with a made-up sha.
pub fn commit(commit_type: &str, subject: &str) -> ClassifiedCommit {
    ClassifiedCommit::new("abc1234def", commit_type, subject)
}

/// A released candidate for a simple package at `path`.
pub fn candidate(
    path: &str,
    component: &str,
    version: &str,
) -> CandidateReleasePullRequest {
    let package = PackageConfigBuilder::default()
        .path(path)
        .component(component)
        .release_type(ReleaseType::Simple)
        .build()
        .unwrap();

    CandidateBuilder::new(Arc::new(Config::default()), test_date())
        .unwrap()
        .build(&package, None, &[], Some(&Version::parse(version).unwrap()))
        .unwrap()
        .unwrap()
}

/// Replaces whatever content a file had.
#[derive(Debug)]
pub struct Replace(pub String);

impl Updater for Replace {
    fn update_content(&self, _content: Option<&str>) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub fn replace_update(path: &str, content: &str) -> Update {
    Update::new(path, true, Replace(content.to_string()))
}

#[derive(Debug, Default)]
struct ForgeState {
    files: BTreeMap<String, String>,
    branches: BTreeMap<String, BTreeMap<String, String>>,
    pulls: Vec<CreatePrRequest>,
}

/// Forge backed by in-memory maps. Clones share state, so a test can keep
/// one handle while the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryForge {
    state: Arc<Mutex<ForgeState>>,
}

impl InMemoryForge {
    /// Sets a file on the base branch.
    pub fn set_file(&self, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_string());
    }

    /// Files written to `branch`, empty when it does not exist.
    pub fn branch_files(&self, branch: &str) -> BTreeMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(branch)
            .cloned()
            .unwrap_or_default()
    }

    pub fn delete_branch(&self, branch: &str) {
        self.state.lock().unwrap().branches.remove(branch);
    }

    pub fn pull_requests(&self) -> Vec<CreatePrRequest> {
        self.state.lock().unwrap().pulls.clone()
    }

    pub fn manager(&self) -> ForgeManager {
        ForgeManager::new(Box::new(self.clone()))
    }
}

#[async_trait]
impl Forge for InMemoryForge {
    fn repo_name(&self) -> String {
        "memory".into()
    }

    fn repository_url(&self) -> Option<String> {
        Some("https://example.com/acme/repo".into())
    }

    async fn read_file(&self, req: ReadFileRequest) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();

        if let Some(content) = state
            .branches
            .get(&req.branch)
            .and_then(|files| files.get(&req.path))
        {
            return Ok(Some(content.clone()));
        }

        Ok(state.files.get(&req.path).cloned())
    }

    async fn list_glob(
        &self,
        pattern: String,
        _branch: String,
    ) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(&pattern)?;
        let state = self.state.lock().unwrap();

        // every file and every directory above it
        let mut paths = BTreeSet::new();
        for file in state.files.keys() {
            let mut current = file.as_str();
            paths.insert(current.to_string());
            while let Some((parent, _)) = current.rsplit_once('/') {
                paths.insert(parent.to_string());
                current = parent;
            }
        }

        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };

        Ok(paths
            .into_iter()
            .filter(|p| pattern.matches_with(p, options))
            .collect())
    }

    async fn create_branch(&self, req: CreateBranchRequest) -> Result<()> {
        let files = req
            .file_changes
            .into_iter()
            .map(|change| (change.path, change.content))
            .collect();

        self.state.lock().unwrap().branches.insert(req.branch, files);
        Ok(())
    }

    async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequestHandle> {
        let mut state = self.state.lock().unwrap();
        state.pulls.push(req.clone());

        Ok(PullRequestHandle {
            number: state.pulls.len() as u64,
            head_branch: req.head_branch,
            url: None,
        })
    }

    async fn read_pull_request(&self, number: u64) -> Result<PullRequest> {
        let state = self.state.lock().unwrap();

        let req = number
            .checked_sub(1)
            .and_then(|index| state.pulls.get(index as usize))
            .ok_or_else(|| {
                ReleaseGraphError::forge(format!("no pull request #{number}"))
            })?;

        Ok(PullRequest {
            number,
            title: req.title.clone(),
            body: req.body.clone(),
            head_branch: req.head_branch.clone(),
        })
    }
}

/// Runs one plugin stage against candidates built from configured
/// packages, prior versions and commits.
pub struct PluginHarness {
    pub config: Arc<Config>,
    pub builder: CandidateBuilder,
    pub forge: InMemoryForge,
    pub manager: ForgeManager,
    pub prior_versions: VersionsMap,
    pub commits: BTreeMap<String, Vec<ClassifiedCommit>>,
    pub checkpoint: RecordingCheckpoint,
}

impl PluginHarness {
    pub fn new(config: Config, prior_versions: &[(&str, &str)]) -> Self {
        let config = Arc::new(config);
        let forge = InMemoryForge::default();

        Self {
            builder: CandidateBuilder::new(Arc::clone(&config), test_date())
                .unwrap(),
            config,
            manager: forge.manager(),
            forge,
            prior_versions: prior_versions
                .iter()
                .map(|(path, version)| {
                    (path.to_string(), Version::parse(version).unwrap())
                })
                .collect(),
            commits: BTreeMap::new(),
            checkpoint: RecordingCheckpoint::default(),
        }
    }

    pub fn commits(&mut self, path: &str, commits: Vec<ClassifiedCommit>) {
        self.commits.insert(path.to_string(), commits);
    }

    /// Candidates the orchestrator would hand to the first plugin.
    pub fn candidates(&self) -> Result<Vec<CandidateReleasePullRequest>> {
        let mut candidates = vec![];

        for package in self.config.packages.iter() {
            let path = package.normalized_path();
            let commits = self.commits.get(&path).cloned().unwrap_or_default();

            if let Some(candidate) = self.builder.build(
                package,
                self.prior_versions.get(&path),
                &commits,
                None,
            )? {
                candidates.push(candidate);
            }
        }

        Ok(candidates)
    }

    pub async fn run<P: ReleasePlugin>(
        &self,
        plugin: &P,
        candidates: Vec<CandidateReleasePullRequest>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let ctx = PluginContext {
            forge: &self.manager,
            builder: &self.builder,
            base_branch: &self.config.base_branch,
            packages: &self.config.packages,
            prior_versions: &self.prior_versions,
            commits: &self.commits,
            checkpoint: &self.checkpoint,
        };

        plugin.run(candidates, &ctx).await
    }

    /// File contents a candidate would write on top of the base branch.
    pub async fn materialize(
        &self,
        candidate: &CandidateReleasePullRequest,
    ) -> BTreeMap<String, String> {
        materialize(
            &self.manager,
            candidate.pull_request.all_updates(),
            &self.config.base_branch,
        )
        .await
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_fixture() {
        let c = candidate("path/a", "pkg1", "1.0.1");
        assert_eq!(c.path, "path/a");
        assert_eq!(c.version(), Some(&Version::new(1, 0, 1)));
        assert_eq!(
            c.pull_request.body.releases[0].changelog_path.as_deref(),
            Some("path/a/CHANGELOG.md")
        );
    }

    #[tokio::test]
    async fn test_in_memory_forge_globs_directories() {
        let forge = InMemoryForge::default();
        forge.set_file("crates/a/Cargo.toml", "");
        forge.set_file("crates/b/src/lib.rs", "");

        let dirs = forge
            .list_glob("crates/*".into(), "main".into())
            .await
            .unwrap();

        assert_eq!(dirs, vec!["crates/a", "crates/b"]);
    }

    #[tokio::test]
    async fn test_in_memory_forge_branch_reads_fall_back_to_base() {
        let forge = InMemoryForge::default();
        forge.set_file("README.md", "base");
        forge
            .create_branch(CreateBranchRequest {
                branch: "feature".into(),
                base_branch: "main".into(),
                message: "m".into(),
                file_changes: vec![],
            })
            .await
            .unwrap();

        let content = forge
            .read_file(ReadFileRequest {
                path: "README.md".into(),
                branch: "feature".into(),
            })
            .await
            .unwrap();

        assert_eq!(content.as_deref(), Some("base"));
    }
}
