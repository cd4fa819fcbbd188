//! Cargo manifest and lockfile updaters.
pub mod cargo_lock;
pub mod cargo_toml;

pub use cargo_lock::CargoLockUpdater;
pub use cargo_toml::CargoTomlUpdater;

/// Dependency tables rewritten when a sibling crate changes version.
pub const DEPENDENCY_KINDS: [&str; 3] =
    ["dependencies", "dev-dependencies", "build-dependencies"];
