//! JSON views of upcoming and opened releases.
use color_eyre::eyre::Result;
use serde_json::{Value, json};
use std::path::Path;
use tokio::fs;

use crate::{
    candidate::CandidateReleasePullRequest,
    cli::{Args, ShowCommand},
    command::common,
    pull_request::ReleaseData,
};

pub async fn execute(args: &Args, cmd: &ShowCommand) -> Result<()> {
    match cmd {
        ShowCommand::NextRelease { commits, out_file } => {
            show_next_release(args, commits, out_file.as_deref()).await
        }
        ShowCommand::PullRequest { number, out_file } => {
            show_pull_request(args, *number, out_file.as_deref()).await
        }
    }
}

/// Release pull requests the next `release-pr` run would open.
async fn show_next_release(
    args: &Args,
    commits_file: &str,
    out_file: Option<&str>,
) -> Result<()> {
    let orchestrator = common::create_orchestrator(args).await?;
    let commits = common::load_commits(commits_file).await?;
    let prior_versions = orchestrator.prior_versions().await?;

    let candidates = orchestrator
        .build_candidates(&prior_versions, &commits)
        .await?;

    let json = Value::Array(candidates.iter().map(candidate_json).collect());
    print_json(json, out_file).await
}

async fn show_pull_request(
    args: &Args,
    number: u64,
    out_file: Option<&str>,
) -> Result<()> {
    let orchestrator = common::create_orchestrator(args).await?;
    let (pull_request, body) =
        orchestrator.read_release_pull_request(number).await?;

    let json = json!({
        "number": pull_request.number,
        "title": pull_request.title,
        "head_branch": pull_request.head_branch,
        "releases": body.releases.iter().map(release_json).collect::<Vec<_>>(),
    });

    print_json(json, out_file).await
}

fn release_json(release: &ReleaseData) -> Value {
    json!({
        "path": release.path,
        "component": release.component,
        "version": release.version.to_string(),
        "changelog_path": release.changelog_path,
        "notes": release.notes,
    })
}

fn candidate_json(candidate: &CandidateReleasePullRequest) -> Value {
    let pr = &candidate.pull_request;

    json!({
        "path": candidate.path,
        "title": pr.title.to_string(),
        "head_branch": pr.head_branch,
        "version": pr.version.as_ref().map(ToString::to_string),
        "previous_version": pr.previous_version.as_ref().map(ToString::to_string),
        "group": pr.group,
        "labels": pr.labels,
        "draft": pr.draft,
        "files": pr.all_updates().iter().map(|u| u.path.clone()).collect::<Vec<_>>(),
        "releases": pr.body.releases.iter().map(release_json).collect::<Vec<_>>(),
    })
}

async fn print_json(json: Value, out_file: Option<&str>) -> Result<()> {
    if let Some(out_file) = out_file {
        let file_path = Path::new(out_file);

        if let Some(parent) = file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&json)?;
        log::info!("writing json to: {}", file_path.display());
        fs::write(file_path, &content).await?;
    } else {
        println!("{json}");
    }

    Ok(())
}
