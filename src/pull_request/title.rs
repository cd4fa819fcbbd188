use semver::Version;
use std::fmt;

use crate::config::DEFAULT_TITLE_PATTERN;

/// Title used when several packages share one pull request.
pub const MERGED_TITLE_PATTERN: &str = "chore${scope}: release ${branch}";

/// A pull request title built from a `${placeholder}` pattern.
///
/// Supported placeholders: `${scope}` (rendered as `(scope)` when set),
/// `${component}` (rendered with a leading space when set), `${version}`
/// and `${branch}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTitle {
    pub pattern: String,
    pub scope: Option<String>,
    pub component: Option<String>,
    pub version: Option<Version>,
    pub branch: String,
}

impl PullRequestTitle {
    pub fn single(
        pattern: Option<&str>,
        component: Option<&str>,
        version: &Version,
        branch: &str,
    ) -> Self {
        Self {
            pattern: pattern.unwrap_or(DEFAULT_TITLE_PATTERN).to_string(),
            scope: None,
            component: component.map(String::from),
            version: Some(version.clone()),
            branch: branch.to_string(),
        }
    }

    pub fn merged(branch: &str) -> Self {
        Self {
            pattern: MERGED_TITLE_PATTERN.to_string(),
            scope: None,
            component: None,
            version: None,
            branch: branch.to_string(),
        }
    }

    pub fn with_scope(mut self, scope: Option<&str>) -> Self {
        self.scope = scope.map(String::from);
        self
    }

    pub fn with_component(mut self, component: Option<&str>) -> Self {
        self.component = component.map(String::from);
        self
    }

    pub fn with_version(mut self, version: &Version) -> Self {
        self.version = Some(version.clone());
        self
    }
}

impl fmt::Display for PullRequestTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self
            .scope
            .as_ref()
            .map(|s| format!("({s})"))
            .unwrap_or_default();
        let component = self
            .component
            .as_ref()
            .map(|c| format!(" {c}"))
            .unwrap_or_default();
        let version = self
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();

        let title = self
            .pattern
            .replace("${scope}", &scope)
            .replace("${component}", &component)
            .replace("${version}", &version)
            .replace("${branch}", &self.branch);

        write!(f, "{}", title.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_package_titles() {
        let title = PullRequestTitle::single(None, Some("core"), &Version::new(1, 2, 0), "main");
        assert_eq!(title.to_string(), "chore: release core 1.2.0");

        let title = PullRequestTitle::single(None, None, &Version::new(1, 2, 0), "main");
        assert_eq!(title.to_string(), "chore: release 1.2.0");
    }

    #[test]
    fn renders_scope_and_custom_patterns() {
        let title = PullRequestTitle::single(
            Some("release(${branch}):${component} v${version}"),
            Some("web"),
            &Version::new(0, 4, 1),
            "develop",
        );
        assert_eq!(title.to_string(), "release(develop): web v0.4.1");

        let title = PullRequestTitle::merged("main").with_scope(Some("deps"));
        assert_eq!(title.to_string(), "chore(deps): release main");
    }
}
