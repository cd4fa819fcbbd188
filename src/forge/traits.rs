//! Traits related to hosting providers
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    error::Result,
    forge::request::{
        CreateBranchRequest, CreatePrRequest, PullRequest, PullRequestHandle,
        ReadFileRequest,
    },
};

/// Capabilities the engine needs from a hosting provider. Transport,
/// authentication and retries belong to implementations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    fn repo_name(&self) -> String;

    /// Web URL of the repository, used for links in bodies and notes
    fn repository_url(&self) -> Option<String>;

    /// Text of a file at a ref, `None` when it does not exist there
    async fn read_file(&self, req: ReadFileRequest) -> Result<Option<String>>;

    /// Repository-relative paths matching a glob pattern at a ref
    async fn list_glob(&self, pattern: String, branch: String)
    -> Result<Vec<String>>;

    /// Creates or force-updates a branch forked from `base_branch` with the
    /// given files written on top
    async fn create_branch(&self, req: CreateBranchRequest) -> Result<()>;

    async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequestHandle>;

    async fn read_pull_request(&self, number: u64) -> Result<PullRequest>;
}
