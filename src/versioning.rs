//! Next-version decisions from classified commits.
pub mod commit;
pub mod policy;
pub mod strategy;

pub use commit::{ClassifiedCommit, CommitNote};
pub use policy::{VersionDecision, VersionPolicy};
pub use strategy::{BumpKind, BumpOptions, VersionStrategy};
