//! Release pull request creation command.
use color_eyre::eyre::Result;
use log::*;

use crate::{
    cli::Args,
    command::common,
};

/// Reads prior versions and pending commits, then opens one pull request
/// per release candidate.
pub async fn execute(args: &Args, commits_file: &str) -> Result<()> {
    let orchestrator = common::create_orchestrator(args).await?;
    let commits = common::load_commits(commits_file).await?;

    let prior_versions = orchestrator.prior_versions().await?;
    debug!("prior versions: {prior_versions:?}");

    let handles = orchestrator
        .release_pull_requests(&prior_versions, &commits)
        .await?;

    for handle in handles.iter() {
        match handle.url.as_ref() {
            Some(url) => info!("#{} {} {url}", handle.number, handle.head_branch),
            None => info!("#{} {}", handle.number, handle.head_branch),
        }
    }

    Ok(())
}
