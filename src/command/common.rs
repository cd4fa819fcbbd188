//! Shared setup for the release commands.
use color_eyre::eyre::{Context, Result};
use log::*;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tokio::fs;

use crate::{
    checkpoint::{Checkpoint, LogCheckpoint},
    cli::Args,
    config::Config,
    forge::{local::LocalForge, manager::ForgeManager},
    orchestrator::ManifestOrchestrator,
    versioning::ClassifiedCommit,
};

#[derive(Debug, Deserialize)]
struct RawCommit {
    sha: String,
    message: String,
}

/// Reads and validates the configuration file inside the repository.
pub async fn load_config(args: &Args) -> Result<Config> {
    let path = Path::new(&args.repo).join(&args.config);
    debug!("loading configuration from {}", path.display());

    let content = fs::read_to_string(&path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;

    Ok(Config::from_toml(&content)?)
}

/// Parses a commits file into classified commits keyed by package path.
pub fn parse_commits(
    content: &str,
) -> Result<BTreeMap<String, Vec<ClassifiedCommit>>> {
    let raw: BTreeMap<String, Vec<RawCommit>> = serde_json::from_str(content)?;

    Ok(raw
        .into_iter()
        .map(|(path, commits)| {
            let commits = commits
                .iter()
                .map(|c| ClassifiedCommit::from_message(&c.sha, &c.message))
                .collect();
            (path, commits)
        })
        .collect())
}

pub async fn load_commits(
    file: &str,
) -> Result<BTreeMap<String, Vec<ClassifiedCommit>>> {
    let content = fs::read_to_string(file)
        .await
        .wrap_err_with(|| format!("failed to read commits file {file}"))?;

    let commits = parse_commits(&content)?;
    info!(
        "loaded {} commit(s) for {} path(s)",
        commits.values().map(Vec::len).sum::<usize>(),
        commits.len()
    );

    Ok(commits)
}

pub async fn create_orchestrator(args: &Args) -> Result<ManifestOrchestrator> {
    let config = load_config(args).await?;

    let forge = LocalForge::new(&args.repo, &args.output, &config.base_branch)
        .with_repository_url(config.repository_url.clone());

    let manager = ForgeManager::new(Box::new(forge)).with_dry_run(args.dry_run);

    let orchestrator = ManifestOrchestrator::builder()
        .config(config)
        .forge(manager)
        .checkpoint(Arc::new(LogCheckpoint) as Arc<dyn Checkpoint>)
        .build()?;

    Ok(orchestrator)
}
