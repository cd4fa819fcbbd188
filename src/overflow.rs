//! Pull request bodies larger than the provider allows are moved to a file
//! on a side branch and replaced with a pointer to it. Reading a pull
//! request back follows the pointer.
use log::*;
use regex::Regex;
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};
use tokio::sync::Mutex;
use url::Url;

use crate::{
    error::{ReleaseGraphError, Result},
    forge::{
        manager::ForgeManager,
        request::{CreateBranchRequest, FileChange, PullRequest},
    },
    pull_request::PullRequestBody,
};

pub const RELEASE_NOTES_FILE: &str = "release-notes.md";
pub const OVERFLOW_BRANCH_SUFFIX: &str = "--release-notes";

const POINTER_MESSAGE: &str = "This release is too large to preview in the pull request body. View the full release notes here:";

static POINTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^This release is too large to preview in the pull request body\. View the full release notes here: (?<url>\S+)",
    )
    .unwrap()
});

/// Branch holding the externalized body of `head_branch`.
pub fn overflow_branch(head_branch: &str) -> String {
    format!("{head_branch}{OVERFLOW_BRANCH_SUFFIX}")
}

/// Whether `body` is a pointer written by [`OverflowHandler`].
pub fn is_overflow(body: &str) -> bool {
    POINTER_REGEX.is_match(body.trim())
}

pub struct OverflowHandler {
    forge: Arc<ForgeManager>,
    max_body_size: usize,
    repository_url: Option<String>,
    // one write at a time per side branch
    branch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OverflowHandler {
    pub fn new(
        forge: Arc<ForgeManager>,
        max_body_size: usize,
        repository_url: Option<String>,
    ) -> Self {
        Self {
            forge,
            max_body_size,
            repository_url,
            branch_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn branch_lock(&self, branch: &str) -> Arc<Mutex<()>> {
        let mut locks = self.branch_locks.lock().await;
        Arc::clone(locks.entry(branch.to_string()).or_default())
    }

    /// Link to the externalized notes. Branch segments are kept as separate
    /// path segments so the branch can be recovered from the link.
    pub fn notes_url(&self, branch: &str) -> Result<Url> {
        let base = self.repository_url.as_deref().unwrap_or("file:///");
        let mut url = Url::parse(base)?;

        url.path_segments_mut()
            .map_err(|_| {
                ReleaseGraphError::configuration(format!(
                    "repository_url cannot carry a path: {base}"
                ))
            })?
            .pop_if_empty()
            .push("blob")
            .extend(branch.split('/'))
            .push(RELEASE_NOTES_FILE);

        Ok(url)
    }

    /// Returns `body` unchanged when it fits. Otherwise writes it to the
    /// side branch of `head_branch` and returns the pointer message.
    pub async fn handle_overflow(
        &self,
        head_branch: &str,
        base_branch: &str,
        body: &str,
    ) -> Result<String> {
        if body.len() <= self.max_body_size {
            return Ok(body.to_string());
        }

        let branch = overflow_branch(head_branch);
        info!(
            "pull request body is {} bytes (limit {}), moving it to {branch}",
            body.len(),
            self.max_body_size
        );

        let lock = self.branch_lock(&branch).await;
        let _guard = lock.lock().await;

        self.forge
            .write_branch(CreateBranchRequest {
                branch: branch.clone(),
                base_branch: base_branch.to_string(),
                message: "chore: add release notes".into(),
                file_changes: vec![FileChange {
                    path: RELEASE_NOTES_FILE.into(),
                    content: body.to_string(),
                }],
            })
            .await?;

        Ok(format!("{POINTER_MESSAGE} {}", self.notes_url(&branch)?))
    }

    /// Body of a pull request with any overflow pointer resolved. Never
    /// fails: when the side file cannot be read the literal body is
    /// returned.
    pub async fn parse_overflow(&self, pull_request: &PullRequest) -> String {
        let Some(url) = POINTER_REGEX
            .captures(pull_request.body.trim())
            .and_then(|caps| caps.name("url"))
            .map(|m| m.as_str().to_string())
        else {
            return pull_request.body.clone();
        };

        let Some(branch) = branch_from_url(&url) else {
            warn!("overflow link has no branch: {url}");
            return pull_request.body.clone();
        };

        match self.forge.read_file(RELEASE_NOTES_FILE, &branch).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!(
                    "release notes for #{} missing on {branch}",
                    pull_request.number
                );
                pull_request.body.clone()
            }
            Err(err) => {
                warn!(
                    "failed to read release notes for #{} on {branch}: {err}",
                    pull_request.number
                );
                pull_request.body.clone()
            }
        }
    }

    /// Structured body of a pull request, following any overflow pointer.
    pub async fn parse_body(&self, pull_request: &PullRequest) -> PullRequestBody {
        PullRequestBody::parse(&self.parse_overflow(pull_request).await)
    }
}

fn branch_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    let blob = segments.iter().rposition(|s| *s == "blob")?;
    let rest = segments.get(blob + 1..segments.len().checked_sub(1)?)?;

    if rest.is_empty() {
        return None;
    }

    Some(rest.join("/"))
}
