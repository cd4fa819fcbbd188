use serde::{Deserialize, Serialize};

/// Maps a conventional commit type to a changelog heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogSection {
    #[serde(rename = "type")]
    pub commit_type: String,
    pub section: String,
    #[serde(default)]
    pub hidden: bool,
}

impl ChangelogSection {
    pub fn new(commit_type: &str, section: &str, hidden: bool) -> Self {
        Self {
            commit_type: commit_type.into(),
            section: section.into(),
            hidden,
        }
    }
}

pub fn default_sections() -> Vec<ChangelogSection> {
    vec![
        ChangelogSection::new("feat", "Features", false),
        ChangelogSection::new("fix", "Bug Fixes", false),
        ChangelogSection::new("perf", "Performance Improvements", false),
        ChangelogSection::new("revert", "Reverts", false),
        ChangelogSection::new("deps", "Dependencies", false),
        ChangelogSection::new("docs", "Documentation", true),
        ChangelogSection::new("style", "Styles", true),
        ChangelogSection::new("chore", "Miscellaneous Chores", true),
        ChangelogSection::new("refactor", "Code Refactoring", true),
        ChangelogSection::new("test", "Tests", true),
        ChangelogSection::new("build", "Build System", true),
        ChangelogSection::new("ci", "Continuous Integration", true),
    ]
}
