//! The narrow interface to the hosting provider: read files, list globs,
//! write branches and open or read pull requests.

/// Filesystem-backed forge used by the CLI and tests.
pub mod local;

/// Dry-run aware wrapper with bounded concurrent reads.
pub mod manager;

/// Request and response types exchanged with a forge.
pub mod request;

/// The [`traits::Forge`] capability trait.
pub mod traits;
