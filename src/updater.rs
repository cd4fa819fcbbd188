//! File content updaters.
//!
//! An [`Updater`] turns the old content of one file into its new content. The
//! engine never patches files directly: candidates carry [`Update`]s and the
//! text is produced only when a change set is materialised for submission.
pub mod changelog;
pub mod composite;
pub mod dispatch;
pub mod generic;
pub mod manifest;
pub mod node;
pub mod rust;
pub mod traits;

pub use composite::{CompositeUpdater, merge_updates};
pub use traits::{Update, Updater};
