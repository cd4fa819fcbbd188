use regex::Regex;
use std::sync::LazyLock;

use crate::{error::Result, updater::traits::Updater};

pub const DEFAULT_CHANGELOG_HEADER: &str = "# Changelog";

// a leading top-level markdown heading plus the blank lines after it
static HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?<header>#[^#\n][^\n]*\n*)").unwrap());

/// Prepends a rendered release entry to a changelog, keeping an existing
/// top-level header in place. Creates the file when it does not exist.
#[derive(Debug, Clone)]
pub struct ChangelogUpdater {
    entry: String,
}

impl ChangelogUpdater {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
        }
    }
}

impl Updater for ChangelogUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let entry = self.entry.trim_end();
        let content = content.unwrap_or_default();

        if content.trim().is_empty() {
            return Ok(format!("{DEFAULT_CHANGELOG_HEADER}\n\n{entry}\n"));
        }

        if let Some(caps) = HEADER_REGEX.captures(content)
            && let Some(header) = caps.name("header")
        {
            let rest = &content[header.end()..];
            return Ok(format!(
                "{}\n\n{entry}\n\n{rest}",
                header.as_str().trim_end()
            ));
        }

        Ok(format!("{entry}\n\n{content}"))
    }
}
