//! Command execution for the CLI.
//!
//! Every command loads the configuration from the repository, wires a
//! [`crate::forge::local::LocalForge`] into a
//! [`crate::orchestrator::ManifestOrchestrator`] and runs one operation.

/// Configuration, commit loading and orchestrator setup.
pub mod common;

/// Builds and opens release pull requests.
pub mod release_pr;

/// JSON views of upcoming and opened releases.
pub mod show;
