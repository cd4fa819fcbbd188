//! Release orchestration for monorepos: version decisions, transitive
//! workspace propagation and release pull request assembly.
pub mod candidate;
pub mod changelog;
pub mod checkpoint;
mod cli;
mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod graph;
pub mod manifest;
pub mod orchestrator;
pub mod overflow;
pub mod path_helpers;
pub mod plugins;
pub mod pull_request;
pub mod updater;
pub mod versioning;

pub use cli::{Args, Command, ShowCommand};
pub use command::{release_pr, show};
pub use error::{ReleaseGraphError, Result};
pub use orchestrator::{ManifestOrchestrator, ManifestOrchestratorParams};

#[cfg(test)]
pub mod test_helpers;
