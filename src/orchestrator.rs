//! Turns per-package commits into release pull requests.
//!
//! [`ManifestOrchestrator::build_candidates`] is the pure half: version
//! decisions followed by the plugin pipeline. Nothing is written until
//! [`ManifestOrchestrator::create_pull_requests`] runs, so a fatal error
//! while building leaves no partial release behind.
use chrono::NaiveDate;
use derive_builder::Builder;
use log::*;
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::{
    candidate::{CandidateBuilder, CandidateReleasePullRequest, VersionsMap},
    checkpoint::{Checkpoint, NoopCheckpoint},
    config::Config,
    error::{ReleaseGraphError, Result},
    forge::{
        manager::ForgeManager,
        request::{ChangeSet, PullRequest, PullRequestHandle},
    },
    manifest::parse_manifest,
    overflow::OverflowHandler,
    plugins::{Merge, Plugin, PluginContext},
    pull_request::PullRequestBody,
    updater::{Update, manifest::ReleaseManifestUpdater},
    versioning::ClassifiedCommit,
};

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct ManifestOrchestratorParams {
    pub config: Arc<Config>,
    pub forge: Arc<ForgeManager>,
    #[builder(default = "Arc::new(NoopCheckpoint)")]
    pub checkpoint: Arc<dyn Checkpoint>,
    #[builder(default)]
    pub cancel: CancellationToken,
    /// Release date written into notes
    #[builder(default = "chrono::Local::now().date_naive()")]
    pub date: NaiveDate,
}

impl ManifestOrchestratorParamsBuilder {
    pub fn build(&self) -> Result<ManifestOrchestrator> {
        let params = self._build().map_err(|e| {
            ReleaseGraphError::configuration(format!(
                "Failed to build orchestrator: {e}"
            ))
        })?;
        ManifestOrchestrator::new(params)
    }
}

pub struct ManifestOrchestrator {
    config: Arc<Config>,
    forge: Arc<ForgeManager>,
    checkpoint: Arc<dyn Checkpoint>,
    cancel: CancellationToken,
    builder: CandidateBuilder,
    plugins: Vec<Plugin>,
    overflow: OverflowHandler,
}

impl ManifestOrchestrator {
    pub fn builder() -> ManifestOrchestratorParamsBuilder {
        ManifestOrchestratorParamsBuilder::default()
    }

    pub fn new(params: ManifestOrchestratorParams) -> Result<Self> {
        params.config.validate()?;

        let mut plugins: Vec<Plugin> =
            params.config.plugins.iter().map(Plugin::from_config).collect();

        if !params.config.separate_pull_requests {
            plugins.push(Plugin::Merge(
                Merge::new().with_title_pattern(
                    params.config.pull_request_title_pattern.clone(),
                ),
            ));
        }

        let repository_url = params
            .config
            .repository_url
            .clone()
            .or_else(|| params.forge.repository_url());

        Ok(Self {
            builder: CandidateBuilder::new(Arc::clone(&params.config), params.date)?,
            overflow: OverflowHandler::new(
                Arc::clone(&params.forge),
                params.config.max_body_size,
                repository_url,
            ),
            config: params.config,
            forge: params.forge,
            checkpoint: params.checkpoint,
            cancel: params.cancel,
            plugins,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Versions recorded by the last merged release, empty before the first.
    pub async fn prior_versions(&self) -> Result<VersionsMap> {
        let content = self
            .forge
            .read_file(&self.config.manifest_file, &self.config.base_branch)
            .await?;

        match content {
            Some(content) => parse_manifest(&content),
            None => {
                info!(
                    "{} not found, treating every package as unreleased",
                    self.config.manifest_file
                );
                Ok(VersionsMap::new())
            }
        }
    }

    /// Builds and submits every release pull request.
    pub async fn release_pull_requests(
        &self,
        prior_versions: &VersionsMap,
        commits: &BTreeMap<String, Vec<ClassifiedCommit>>,
    ) -> Result<Vec<PullRequestHandle>> {
        let candidates = self.build_candidates(prior_versions, commits).await?;

        if candidates.is_empty() {
            self.checkpoint.success("nothing to release");
            return Ok(vec![]);
        }

        self.create_pull_requests(candidates, prior_versions).await
    }

    /// Candidates for every package with releasable commits, after all
    /// plugins ran. Only reads from the forge.
    pub async fn build_candidates(
        &self,
        prior_versions: &VersionsMap,
        commits: &BTreeMap<String, Vec<ClassifiedCommit>>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let commits: BTreeMap<String, Vec<ClassifiedCommit>> = commits
            .iter()
            .map(|(path, list)| {
                let list = self
                    .plugins
                    .iter()
                    .fold(list.clone(), |list, plugin| plugin.process_commits(list));
                (path.clone(), list)
            })
            .collect();

        let mut candidates = vec![];

        for package in self.config.packages.iter() {
            self.check_cancelled()?;

            let path = package.normalized_path();
            let package_commits =
                commits.get(&path).map(Vec::as_slice).unwrap_or_default();

            if let Some(candidate) = self.builder.build(
                package,
                prior_versions.get(&path),
                package_commits,
                None,
            )? {
                candidates.push(candidate);
            }
        }

        let ctx = PluginContext {
            forge: &self.forge,
            builder: &self.builder,
            base_branch: &self.config.base_branch,
            packages: &self.config.packages,
            prior_versions,
            commits: &commits,
            checkpoint: self.checkpoint.as_ref(),
        };

        for plugin in self.plugins.iter() {
            self.check_cancelled()?;
            candidates = plugin.run(candidates, &ctx).await?;
        }

        self.checkpoint
            .success(&format!("{} release pull request(s) prepared", candidates.len()));

        Ok(candidates)
    }

    /// Materializes and submits each candidate in order.
    pub async fn create_pull_requests(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        prior_versions: &VersionsMap,
    ) -> Result<Vec<PullRequestHandle>> {
        let mut handles = vec![];

        for candidate in candidates.iter() {
            self.check_cancelled()?;

            let change_set = self.change_set(candidate, prior_versions).await?;
            let title = change_set.title.clone();
            let handle = self.forge.submit_change_set(change_set).await?;

            self.checkpoint
                .success(&format!("opened #{} {title}", handle.number));
            handles.push(handle);
        }

        Ok(handles)
    }

    /// Branch contents, title and body of a candidate's pull request.
    pub async fn change_set(
        &self,
        candidate: &CandidateReleasePullRequest,
        prior_versions: &VersionsMap,
    ) -> Result<ChangeSet> {
        let pr = &candidate.pull_request;
        let base_branch = &self.config.base_branch;

        let mut versions = prior_versions.clone();
        versions.extend(candidate.released_versions());

        let mut updates = pr.all_updates();
        updates.push(Update::new(
            self.config.manifest_file.clone(),
            true,
            ReleaseManifestUpdater::new(versions),
        ));

        let files = materialize(&self.forge, updates, base_branch).await?;

        let body = self
            .overflow
            .handle_overflow(&pr.head_branch, base_branch, &pr.body.render())
            .await?;

        let title = pr.title.to_string();

        Ok(ChangeSet {
            branch: pr.head_branch.clone(),
            base_branch: base_branch.clone(),
            files,
            message: title.clone(),
            title,
            body,
            labels: pr.labels.clone(),
            draft: pr.draft,
        })
    }

    /// A submitted release pull request with its body resolved, following
    /// an overflow pointer when there is one.
    pub async fn read_release_pull_request(
        &self,
        number: u64,
    ) -> Result<(PullRequest, PullRequestBody)> {
        let pull_request = self.forge.read_pull_request(number).await?;
        let body = self.overflow.parse_body(&pull_request).await;
        Ok((pull_request, body))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("release run cancelled");
            return Err(ReleaseGraphError::Cancelled);
        }
        Ok(())
    }
}

/// New content of every updated file. Files that do not exist and may not
/// be created are dropped with a warning.
pub async fn materialize(
    forge: &ForgeManager,
    updates: Vec<Update>,
    branch: &str,
) -> Result<BTreeMap<String, String>> {
    let paths = updates.iter().map(|u| u.path.clone()).collect();
    let contents = forge.read_files(paths, branch).await?;

    let mut files = BTreeMap::new();

    for (update, (path, content)) in updates.into_iter().zip(contents) {
        if content.is_none() && !update.create_if_missing {
            warn!(
                "{}, skipping its update",
                ReleaseGraphError::file_not_found(&path, branch)
            );
            continue;
        }

        let updated = update.updater.update_content(content.as_deref())?;
        files.insert(path, updated);
    }

    Ok(files)
}
