//! Release notes rendering.
//!
//! Notes are rendered from a tera template over commits grouped into the
//! configured changelog sections. The template can be replaced through
//! `changelog_template` in the configuration.
use chrono::NaiveDate;
use regex::Regex;
use semver::Version;
use serde::Serialize;
use std::sync::LazyLock;
use tera::{Context, Tera};

use crate::{
    config::ChangelogSection,
    error::Result,
    versioning::commit::{BREAKING_CHANGE_NOTE, ClassifiedCommit},
};

pub const DEFAULT_TEMPLATE: &str = r#"{% if compare_url %}## [{{ version }}]({{ compare_url }}) ({{ date }}){% else %}## {{ version }} ({{ date }}){% endif %}

{% if breaking %}
### ⚠ BREAKING CHANGES

{% for note in breaking %}* {% if note.scope %}**{{ note.scope }}:** {% endif %}{{ note.text }}
{% endfor %}
{% endif %}
{% for section in sections %}
### {{ section.title }}

{% for commit in section.commits %}* {% if commit.scope %}**{{ commit.scope }}:** {% endif %}{{ commit.subject }}{% if commit.link %} ([{{ commit.short_sha }}]({{ commit.link }})){% else %} ({{ commit.short_sha }}){% endif %}
{% endfor %}
{% endfor %}
"#;

const TEMPLATE_NAME: &str = "release-notes";

/// Matches 3 or more consecutive new lines
static EXTRA_NEW_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

#[derive(Debug, Clone, Serialize)]
struct BreakingNote {
    scope: Option<String>,
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct CommitEntry {
    scope: Option<String>,
    subject: String,
    short_sha: String,
    link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SectionEntry {
    title: String,
    commits: Vec<CommitEntry>,
}

#[derive(Debug, Clone, Serialize)]
struct NotesContext {
    version: String,
    previous_version: Option<String>,
    date: String,
    compare_url: Option<String>,
    breaking: Vec<BreakingNote>,
    sections: Vec<SectionEntry>,
}

/// Inputs for one package's release notes.
#[derive(Debug, Clone)]
pub struct NotesParams<'a> {
    pub version: &'a Version,
    pub previous_version: Option<&'a Version>,
    pub component: Option<&'a str>,
    pub commits: &'a [ClassifiedCommit],
    pub date: NaiveDate,
}

/// Renders release notes for packages.
#[derive(Debug, Clone)]
pub struct NotesRenderer {
    tera: Tera,
    sections: Vec<ChangelogSection>,
    repository_url: Option<String>,
}

impl NotesRenderer {
    pub fn new(
        template: Option<&str>,
        sections: Vec<ChangelogSection>,
        repository_url: Option<String>,
    ) -> Result<Self> {
        // compile once, render per package
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template.unwrap_or(DEFAULT_TEMPLATE))?;

        Ok(Self {
            tera,
            sections,
            repository_url: repository_url
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn render(&self, params: &NotesParams) -> Result<String> {
        let context = self.context(params);
        let rendered = self
            .tera
            .render(TEMPLATE_NAME, &Context::from_serialize(&context)?)?;
        Ok(strip_extra_lines(&rendered))
    }

    fn context(&self, params: &NotesParams) -> NotesContext {
        let compare_url = match (self.repository_url.as_ref(), params.previous_version)
        {
            (Some(url), Some(previous)) => Some(format!(
                "{url}/compare/{}...{}",
                tag_name(params.component, previous),
                tag_name(params.component, params.version)
            )),
            _ => None,
        };

        let mut breaking = vec![];
        for commit in params.commits.iter().filter(|c| c.breaking) {
            let mut notes = commit
                .notes
                .iter()
                .filter(|n| n.title == BREAKING_CHANGE_NOTE)
                .peekable();

            if notes.peek().is_none() {
                breaking.push(BreakingNote {
                    scope: commit.scope.clone(),
                    text: commit.subject.clone(),
                });
                continue;
            }

            for note in notes {
                breaking.push(BreakingNote {
                    scope: commit.scope.clone(),
                    text: note.text.clone(),
                });
            }
        }

        let sections = self
            .sections
            .iter()
            .filter(|s| !s.hidden)
            .filter_map(|section| {
                let commits: Vec<CommitEntry> = params
                    .commits
                    .iter()
                    .filter(|c| c.commit_type == section.commit_type)
                    .map(|c| self.commit_entry(c))
                    .collect();

                if commits.is_empty() {
                    return None;
                }

                Some(SectionEntry {
                    title: section.section.clone(),
                    commits,
                })
            })
            .collect();

        NotesContext {
            version: params.version.to_string(),
            previous_version: params.previous_version.map(|v| v.to_string()),
            date: params.date.format("%Y-%m-%d").to_string(),
            compare_url,
            breaking,
            sections,
        }
    }

    fn commit_entry(&self, commit: &ClassifiedCommit) -> CommitEntry {
        CommitEntry {
            scope: commit.scope.clone(),
            subject: commit.subject.clone(),
            short_sha: commit.short_sha().to_string(),
            link: self
                .repository_url
                .as_ref()
                .map(|url| format!("{url}/commit/{}", commit.sha)),
        }
    }
}

/// Tag naming used for compare links: `v1.2.3` or `component-v1.2.3`.
pub fn tag_name(component: Option<&str>, version: &Version) -> String {
    match component {
        Some(component) => format!("{component}-v{version}"),
        None => format!("v{version}"),
    }
}

/// Replaces runs of blank lines with a single blank line and trims.
pub fn strip_extra_lines(notes: &str) -> String {
    EXTRA_NEW_LINES_REGEX
        .replace_all(notes, "\n\n")
        .trim()
        .to_string()
}

/// Whether rendered notes contain anything beyond the version heading.
pub fn has_entries(notes: &str) -> bool {
    notes.lines().skip(1).any(|line| !line.trim().is_empty())
}

/// Adds a chore entry to notes that would otherwise be a bare heading.
pub fn with_meta_information_stub(notes: &str) -> String {
    if has_entries(notes) {
        return notes.to_string();
    }
    format!("{notes}\n\n### Miscellaneous Chores\n\n* updating meta-information")
}

/// A sibling package whose version changed underneath a dependent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBump {
    pub name: String,
    pub from: Option<Version>,
    pub to: Version,
}

/// Appends a "Dependencies" section listing updated workspace siblings.
pub fn append_dependency_notes(notes: &str, bumps: &[DependencyBump]) -> String {
    if bumps.is_empty() {
        return notes.to_string();
    }

    let mut section = String::from(
        "### Dependencies\n\n* The following workspace dependencies were updated",
    );

    for bump in bumps.iter() {
        let line = match bump.from.as_ref() {
            Some(from) => {
                format!("\n    * {} bumped from {from} to {}", bump.name, bump.to)
            }
            None => format!("\n    * {} bumped to {}", bump.name, bump.to),
        };
        section.push_str(&line);
    }

    format!("{}\n\n{section}", notes.trim_end())
}
