//! Manager that wraps forge implementations
use futures_util::{StreamExt, TryStreamExt, stream};
use log::*;

use crate::{
    error::{ReleaseGraphError, Result},
    forge::{
        request::{
            ChangeSet, CreateBranchRequest, CreatePrRequest, FileChange,
            PullRequest, PullRequestHandle, ReadFileRequest,
        },
        traits::Forge,
    },
};

/// Default number of file reads in flight at once.
pub const DEFAULT_READ_CONCURRENCY: usize = 8;

/// Wraps a [`Forge`] adding dry-run handling and bounded concurrent reads.
pub struct ForgeManager {
    forge: Box<dyn Forge>,
    dry_run: bool,
    read_concurrency: usize,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>) -> Self {
        Self {
            forge,
            dry_run: false,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_read_concurrency(mut self, read_concurrency: usize) -> Self {
        self.read_concurrency = read_concurrency.max(1);
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn repo_name(&self) -> String {
        self.forge.repo_name()
    }

    pub fn repository_url(&self) -> Option<String> {
        self.forge.repository_url()
    }

    pub async fn read_file(
        &self,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>> {
        debug!("reading {path} at {branch}");
        self.forge
            .read_file(ReadFileRequest {
                path: path.to_string(),
                branch: branch.to_string(),
            })
            .await
    }

    /// Reads several files concurrently. Results keep the order of `paths`
    /// and the first failure aborts the batch.
    pub async fn read_files(
        &self,
        paths: Vec<String>,
        branch: &str,
    ) -> Result<Vec<(String, Option<String>)>> {
        stream::iter(paths)
            .map(|path| async move {
                let content = self.read_file(&path, branch).await?;
                Ok::<_, ReleaseGraphError>((path, content))
            })
            .buffered(self.read_concurrency)
            .try_collect()
            .await
    }

    pub async fn list_glob(
        &self,
        pattern: &str,
        branch: &str,
    ) -> Result<Vec<String>> {
        self.forge
            .list_glob(pattern.to_string(), branch.to_string())
            .await
    }

    pub async fn write_branch(&self, req: CreateBranchRequest) -> Result<()> {
        if self.dry_run {
            warn!(
                "dry_run: would write {} file(s) to branch {}",
                req.file_changes.len(),
                req.branch
            );
            return Ok(());
        }

        info!("writing branch {} from {}", req.branch, req.base_branch);
        self.forge.create_branch(req).await
    }

    /// Writes the change set's branch, then opens its pull request.
    pub async fn submit_change_set(
        &self,
        change_set: ChangeSet,
    ) -> Result<PullRequestHandle> {
        if self.dry_run {
            warn!(
                "dry_run: would submit {} on {}: files: {:?}",
                change_set.title,
                change_set.branch,
                change_set.files.keys().collect::<Vec<_>>()
            );
            return Ok(PullRequestHandle {
                number: 0,
                head_branch: change_set.branch,
                url: None,
            });
        }

        let file_changes = change_set
            .files
            .into_iter()
            .map(|(path, content)| FileChange { path, content })
            .collect();

        self.forge
            .create_branch(CreateBranchRequest {
                branch: change_set.branch.clone(),
                base_branch: change_set.base_branch.clone(),
                message: change_set.message,
                file_changes,
            })
            .await?;

        let handle = self
            .forge
            .create_pull_request(CreatePrRequest {
                head_branch: change_set.branch,
                base_branch: change_set.base_branch,
                title: change_set.title,
                body: change_set.body,
                labels: change_set.labels,
                draft: change_set.draft,
            })
            .await?;

        info!("opened pull request #{}", handle.number);

        Ok(handle)
    }

    pub async fn read_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.forge.read_pull_request(number).await
    }
}
