//! Error types for the release graph engine.

use thiserror::Error;

/// Main error type for release graph operations.
#[derive(Error, Debug)]
pub enum ReleaseGraphError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    // Workspace / manifest errors
    #[error("Missing or unparseable manifest for workspace member: {path}")]
    MissingManifest { path: String },

    #[error("Package manifest at {path} does not declare a name")]
    UnnamedPackage { path: String },

    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Dependency not found: {node} depends on unknown {dependency}")]
    DependencyNotFound { node: String, dependency: String },

    #[error("File not found: {path} (ref: {branch})")]
    FileNotFound { path: String, branch: String },

    #[error("Invalid version for {package}: {version}")]
    InvalidPackageVersion { package: String, version: String },

    // Forge errors
    #[error("Forge operation failed: {0}")]
    Forge(String),

    #[error("Operation cancelled")]
    Cancelled,

    // Version/parsing errors - automatic conversions via #[from]
    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Regular expression error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using ReleaseGraphError
pub type Result<T> = std::result::Result<T, ReleaseGraphError>;

impl ReleaseGraphError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::Forge(msg.into())
    }

    pub fn missing_manifest(path: impl Into<String>) -> Self {
        Self::MissingManifest { path: path.into() }
    }

    pub fn unnamed_package(path: impl Into<String>) -> Self {
        Self::UnnamedPackage { path: path.into() }
    }

    pub fn file_not_found(
        path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self::FileNotFound {
            path: path.into(),
            branch: branch.into(),
        }
    }
}

// Wrap std::io::Error in Other for generic I/O errors
impl From<std::io::Error> for ReleaseGraphError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = ReleaseGraphError::configuration("no workspace members");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: no workspace members"
        );

        let err = ReleaseGraphError::Cycle {
            path: vec!["a".into(), "b".into(), "c".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> c -> a");

        let err = ReleaseGraphError::missing_manifest("crates/core/Cargo.toml");
        assert!(err.to_string().contains("crates/core/Cargo.toml"));
    }

    #[test]
    fn test_file_not_found_names_branch() {
        let err = ReleaseGraphError::file_not_found("a.txt", "main");
        assert_eq!(err.to_string(), "File not found: a.txt (ref: main)");
    }

    #[test]
    fn test_from_conversions() {
        let semver_err = semver::Version::parse("invalid");
        assert!(semver_err.is_err());
        let err: ReleaseGraphError = semver_err.unwrap_err().into();
        assert!(matches!(err, ReleaseGraphError::InvalidVersion(_)));
    }
}
