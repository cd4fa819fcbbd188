use log::*;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::{DEFAULT_PR_FOOTER, DEFAULT_PR_HEADER};

/// One release section: hidden metadata comment followed by a collapsible
/// `<details>` block holding the notes.
static SECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^<!--(?<metadata>\{.*?\})-->\n<details(?: open)?><summary>(?<summary>[^<]*)</summary>\n\n(?<notes>.*?)\n</details>",
    )
    .unwrap()
});

const SEPARATOR: &str = "---";

/// Release of one package within a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseData {
    /// Package path relative to the repository root
    pub path: String,
    pub component: Option<String>,
    pub version: Version,
    pub notes: String,
    /// Repository-relative changelog to prepend `notes` to, if any
    pub changelog_path: Option<String>,
}

impl ReleaseData {
    fn summary(&self) -> String {
        match self.component.as_ref() {
            Some(component) => format!("{component}: {}", self.version),
            None => self.version.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReleaseMetadata {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<String>,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    changelog_path: Option<String>,
}

/// Structured pull request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestBody {
    pub header: String,
    pub releases: Vec<ReleaseData>,
    pub footer: String,
}

impl Default for PullRequestBody {
    fn default() -> Self {
        Self {
            header: DEFAULT_PR_HEADER.into(),
            releases: vec![],
            footer: DEFAULT_PR_FOOTER.into(),
        }
    }
}

impl PullRequestBody {
    pub fn new(releases: Vec<ReleaseData>) -> Self {
        Self {
            releases,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, header: &str, footer: &str) -> Self {
        self.header = header.to_string();
        self.footer = footer.to_string();
        self
    }

    pub fn render(&self) -> String {
        // expand the only dropdown
        let details = if self.releases.len() == 1 {
            "<details open>"
        } else {
            "<details>"
        };

        let sections = self
            .releases
            .iter()
            .map(|release| {
                let metadata = ReleaseMetadata {
                    path: release.path.clone(),
                    component: release.component.clone(),
                    version: release.version.to_string(),
                    changelog_path: release.changelog_path.clone(),
                };
                // serializing a struct of strings cannot fail
                let json = serde_json::to_string(&metadata).unwrap_or_default();

                format!(
                    "<!--{json}-->\n{details}<summary>{}</summary>\n\n{}\n</details>",
                    release.summary(),
                    release.notes.trim_end()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "{}\n{SEPARATOR}\n\n{sections}\n\n{SEPARATOR}\n{}\n",
            self.header, self.footer
        )
    }

    /// Parses a rendered body. Text with no recognisable release sections
    /// is kept whole as the header so nothing is lost.
    pub fn parse(text: &str) -> Self {
        let mut releases = vec![];
        let mut first_start: Option<usize> = None;
        let mut last_end = 0;

        for caps in SECTION_REGEX.captures_iter(text) {
            let (Some(whole), Some(metadata), Some(notes)) =
                (caps.get(0), caps.name("metadata"), caps.name("notes"))
            else {
                continue;
            };

            let metadata: ReleaseMetadata =
                match serde_json::from_str(metadata.as_str()) {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        warn!("skipping release section with bad metadata: {err}");
                        continue;
                    }
                };

            let Ok(version) = Version::parse(&metadata.version) else {
                warn!("skipping release section with bad version: {}", metadata.version);
                continue;
            };

            first_start.get_or_insert(whole.start());
            last_end = whole.end();

            releases.push(ReleaseData {
                path: metadata.path,
                component: metadata.component,
                version,
                notes: notes.as_str().to_string(),
                changelog_path: metadata.changelog_path,
            });
        }

        let Some(first_start) = first_start else {
            return Self {
                header: text.trim().to_string(),
                releases,
                footer: String::new(),
            };
        };

        let header = text[..first_start].trim_end();
        let header = header.strip_suffix(SEPARATOR).unwrap_or(header).trim();

        let footer = text[last_end..].trim_start();
        let footer = footer.strip_prefix(SEPARATOR).unwrap_or(footer).trim();

        Self {
            header: header.to_string(),
            releases,
            footer: footer.to_string(),
        }
    }
}
