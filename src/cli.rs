//! CLI argument parsing.
use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

pub const DEFAULT_OUTPUT_DIR: &str = ".release-graph";

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = ".", global = true)]
    /// Repository working directory that files are read from.
    pub repo: String,

    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    /// Configuration file, relative to the repository.
    pub config: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR, global = true)]
    /// Directory that written branches and pull requests are recorded in.
    pub output: String,

    #[arg(long, default_value_t = false, global = true)]
    /// Log what would be written without writing anything.
    pub dry_run: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and open release pull requests for pending commits.
    ReleasePR {
        #[arg(long)]
        /// JSON file mapping package paths to their commits since the last
        /// release: `{"path": [{"sha": "...", "message": "..."}]}`.
        commits: String,
    },

    /// Print release information as JSON.
    Show {
        #[command(subcommand)]
        command: ShowCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowCommand {
    /// Release pull requests that would be opened, without writing them.
    NextRelease {
        #[arg(long)]
        /// Commits file, same format as for release-pr.
        commits: String,

        #[arg(long)]
        /// Write the JSON here instead of stdout.
        out_file: Option<String>,
    },

    /// Releases listed in an opened pull request.
    PullRequest {
        /// Pull request number.
        number: u64,

        #[arg(long)]
        /// Write the JSON here instead of stdout.
        out_file: Option<String>,
    },
}
