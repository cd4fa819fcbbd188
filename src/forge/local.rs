//! Local forge implementation for offline use and testing.
//!
//! Files are read from a working directory. Branch writes and pull requests
//! are recorded under an output directory:
//!
//! ```text
//! <output>/branches/<branch>/<path>   written file content
//! <output>/pulls/<number>.json        opened pull requests
//! ```
//!
//! Reads at a branch other than the base see that branch's written files
//! first and fall back to the working directory.
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};

use crate::{
    error::{ReleaseGraphError, Result},
    forge::{
        request::{
            CreateBranchRequest, CreatePrRequest, PullRequest,
            PullRequestHandle, ReadFileRequest,
        },
        traits::Forge,
    },
    path_helpers::normalize_path,
};

pub struct LocalForge {
    root: PathBuf,
    output: PathBuf,
    base_branch: String,
    repository_url: Option<String>,
    // serializes pull request number allocation
    pulls: Mutex<()>,
}

impl LocalForge {
    pub fn new(
        root: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        base_branch: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            base_branch: base_branch.into(),
            repository_url: None,
            pulls: Mutex::new(()),
        }
    }

    pub fn with_repository_url(mut self, url: Option<String>) -> Self {
        self.repository_url = url;
        self
    }

    fn branch_dir(&self, branch: &str) -> PathBuf {
        self.output.join("branches").join(branch)
    }

    fn pulls_dir(&self) -> PathBuf {
        self.output.join("pulls")
    }

    async fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl Forge for LocalForge {
    fn repo_name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "local".into())
    }

    fn repository_url(&self) -> Option<String> {
        self.repository_url.clone()
    }

    async fn read_file(&self, req: ReadFileRequest) -> Result<Option<String>> {
        let path = normalize_path(&req.path).into_owned();

        if req.branch != self.base_branch {
            let branch_file = self.branch_dir(&req.branch).join(&path);
            if let Some(content) = Self::read_optional(&branch_file).await? {
                return Ok(Some(content));
            }
        }

        Self::read_optional(&self.root.join(&path)).await
    }

    async fn list_glob(
        &self,
        pattern: String,
        _branch: String,
    ) -> Result<Vec<String>> {
        let pattern = normalize_path(&pattern).into_owned();
        let full = self.root.join(&pattern);
        let full = full.to_string_lossy();

        let mut paths = vec![];

        for entry in glob::glob(&full)? {
            let entry = entry.map_err(|err| {
                ReleaseGraphError::forge(format!("glob {pattern}: {err}"))
            })?;

            if let Ok(relative) = entry.strip_prefix(&self.root) {
                paths.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }

        paths.sort();
        Ok(paths)
    }

    async fn create_branch(&self, req: CreateBranchRequest) -> Result<()> {
        let dir = self.branch_dir(&req.branch);

        // force-update semantics: the branch is rewritten from scratch
        if fs::try_exists(&dir).await? {
            fs::remove_dir_all(&dir).await?;
        }

        for change in req.file_changes.iter() {
            let target = dir.join(normalize_path(&change.path).as_ref());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target, &change.content).await?;
        }

        log::info!(
            "local forge: wrote {} file(s) to {}",
            req.file_changes.len(),
            dir.display()
        );

        Ok(())
    }

    async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequestHandle> {
        let _guard = self.pulls.lock().await;

        let dir = self.pulls_dir();
        fs::create_dir_all(&dir).await?;

        let mut number = 1;
        while fs::try_exists(dir.join(format!("{number}.json"))).await? {
            number += 1;
        }

        let pr = PullRequest {
            number,
            title: req.title.clone(),
            body: req.body.clone(),
            head_branch: req.head_branch.clone(),
        };

        let record = serde_json::json!({
            "pull_request": pr,
            "base_branch": req.base_branch,
            "labels": req.labels,
            "draft": req.draft,
        });

        let path = dir.join(format!("{number}.json"));
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;

        Ok(PullRequestHandle {
            number,
            head_branch: req.head_branch,
            url: Some(path.display().to_string()),
        })
    }

    async fn read_pull_request(&self, number: u64) -> Result<PullRequest> {
        let path = self.pulls_dir().join(format!("{number}.json"));

        let content = Self::read_optional(&path).await?.ok_or_else(|| {
            ReleaseGraphError::forge(format!("pull request #{number} not found"))
        })?;

        let record: serde_json::Value = serde_json::from_str(&content)?;
        Ok(serde_json::from_value(record["pull_request"].clone())?)
    }
}
