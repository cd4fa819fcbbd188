use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported release types. Each selects the default set of files updated
/// when a package of that type is released.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReleaseType {
    /// Changelog and configured extra files only
    #[default]
    Generic,
    /// Changelog plus a `version.txt`
    Simple,
    /// Cargo.toml / Cargo.lock
    Rust,
    /// package.json / package-lock.json
    Node,
}

impl ReleaseType {
    /// Version assigned to a package that has never been released.
    pub fn default_initial_version(&self) -> semver::Version {
        match self {
            ReleaseType::Node => semver::Version::new(1, 0, 0),
            _ => semver::Version::new(0, 1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_and_parse_round_trip() {
        for release_type in [
            ReleaseType::Generic,
            ReleaseType::Simple,
            ReleaseType::Rust,
            ReleaseType::Node,
        ] {
            let name = release_type.to_string();
            assert_eq!(ReleaseType::from_str(&name).unwrap(), release_type);
        }
    }

    #[test]
    fn initial_versions() {
        assert_eq!(
            ReleaseType::Rust.default_initial_version().to_string(),
            "0.1.0"
        );
        assert_eq!(
            ReleaseType::Node.default_initial_version().to_string(),
            "1.0.0"
        );
    }
}
