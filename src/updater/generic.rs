use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::{error::Result, updater::traits::Updater};

/// Default pattern used to find version strings in arbitrary files. Each
/// matching line keeps its `start`/`end` captures and swaps `version`.
pub const GENERIC_VERSION_REGEX_PATTERN: &str = r#"(?m)^(?<start>.*version"?:?\s*=?\s*['"]?)(?<version>\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?)(?<end>['",]?.*)$"#;

pub static GENERIC_VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GENERIC_VERSION_REGEX_PATTERN).unwrap());

/// Replaces version strings in any text file using a regex.
#[derive(Debug, Clone)]
pub struct GenericUpdater {
    version: Version,
    pattern: Regex,
}

impl GenericUpdater {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            pattern: GENERIC_VERSION_REGEX.clone(),
        }
    }

    /// Uses a caller supplied pattern. It must define a `version` capture
    /// and may define `start`/`end` captures.
    pub fn with_pattern(version: Version, pattern: &str) -> Result<Self> {
        Ok(Self::with_regex(version, Regex::new(pattern)?))
    }

    pub fn with_regex(version: Version, pattern: Regex) -> Self {
        Self { version, pattern }
    }
}

impl Updater for GenericUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let content = content.unwrap_or_default();
        let next = self.version.to_string();

        let updated = self.pattern.replace_all(content, |caps: &regex::Captures| {
            let whole = &caps[0];
            // only the `version` capture is swapped; the rest of the match
            // is written back untouched
            match caps.name("version") {
                Some(found) => {
                    let offset = caps.get(0).map(|m| m.start()).unwrap_or(0);
                    let start = found.start() - offset;
                    let end = found.end() - offset;
                    format!("{}{next}{}", &whole[..start], &whole[end..])
                }
                None => whole.to_string(),
            }
        });

        Ok(updated.into_owned())
    }
}

/// Writes the bare version followed by a newline (e.g. `version.txt`).
#[derive(Debug, Clone)]
pub struct VersionFileUpdater {
    version: Version,
}

impl VersionFileUpdater {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl Updater for VersionFileUpdater {
    fn update_content(&self, _content: Option<&str>) -> Result<String> {
        Ok(format!("{}\n", self.version))
    }
}
