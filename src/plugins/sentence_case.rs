//! Capitalizes commit subjects before release notes are rendered.
use async_trait::async_trait;
use std::collections::HashSet;

use crate::{
    candidate::CandidateReleasePullRequest,
    config::plugin::SentenceCaseConfig,
    error::Result,
    plugins::{PluginContext, ReleasePlugin},
    versioning::ClassifiedCommit,
};

/// Words whose casing is meaningful and must never change.
const SPECIAL_WORDS: [&str; 4] = ["iOS", "iPhone", "npm", "macOS"];

#[derive(Debug, Clone)]
pub struct SentenceCase {
    special_words: HashSet<String>,
}

impl SentenceCase {
    pub fn new(config: &SentenceCaseConfig) -> Self {
        let special_words = SPECIAL_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.special_words.iter().cloned())
            .collect();

        Self { special_words }
    }

    pub fn to_sentence_case(&self, subject: &str) -> String {
        let first_word = subject.split_whitespace().next().unwrap_or_default();
        if self.special_words.contains(first_word) {
            return subject.to_string();
        }

        let mut chars = subject.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[async_trait]
impl ReleasePlugin for SentenceCase {
    fn process_commits(
        &self,
        commits: Vec<ClassifiedCommit>,
    ) -> Vec<ClassifiedCommit> {
        commits
            .into_iter()
            .map(|mut commit| {
                commit.subject = self.to_sentence_case(&commit.subject);
                commit
            })
            .collect()
    }

    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        _ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::commit;

    #[test]
    fn capitalizes_first_letter() {
        let plugin = SentenceCase::new(&SentenceCaseConfig::default());
        let commits =
            plugin.process_commits(vec![commit("fix", "handle empty input")]);
        assert_eq!(commits[0].subject, "Handle empty input");
    }

    #[test]
    fn leaves_special_words_alone() {
        let plugin = SentenceCase::new(&SentenceCaseConfig {
            special_words: vec!["gRPC".into()],
        });

        assert_eq!(plugin.to_sentence_case("gRPC transport"), "gRPC transport");
        assert_eq!(plugin.to_sentence_case("npm scripts"), "npm scripts");
        assert_eq!(plugin.to_sentence_case(""), "");
    }
}
