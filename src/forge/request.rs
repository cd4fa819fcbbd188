use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to read a file at a branch.
pub struct ReadFileRequest {
    pub path: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// New content for a repository file.
pub struct FileChange {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Request to create a branch carrying file changes.
pub struct CreateBranchRequest {
    pub branch: String,
    pub base_branch: String,
    pub message: String,
    pub file_changes: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Request to open a pull request.
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Handle of a pull request that was opened.
pub struct PullRequestHandle {
    pub number: u64,
    pub head_branch: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Pull request as read back from the provider.
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub head_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything needed to publish one release pull request.
pub struct ChangeSet {
    pub branch: String,
    pub base_branch: String,
    /// Path → full new content
    pub files: BTreeMap<String, String>,
    pub message: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub draft: bool,
}
