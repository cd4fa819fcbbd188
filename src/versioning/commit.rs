use git_conventional::Commit as ConventionalCommit;
use serde::{Deserialize, Serialize};

/// Note title marking a breaking change.
pub const BREAKING_CHANGE_NOTE: &str = "BREAKING CHANGE";
/// Note title asserting an explicit next version.
pub const RELEASE_AS_NOTE: &str = "RELEASE AS";

/// A titled note attached to a commit, such as a breaking change
/// description or a `Release-As` footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNote {
    pub title: String,
    pub text: String,
}

impl CommitNote {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// A commit already reduced to the fields release decisions need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    pub sha: String,
    /// Lower-cased conventional type, empty for non-conventional commits
    #[serde(rename = "type")]
    pub commit_type: String,
    pub scope: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub breaking: bool,
    #[serde(default)]
    pub notes: Vec<CommitNote>,
}

impl ClassifiedCommit {
    pub fn new(sha: &str, commit_type: &str, subject: &str) -> Self {
        Self {
            sha: sha.into(),
            commit_type: commit_type.into(),
            scope: None,
            subject: subject.into(),
            breaking: false,
            notes: vec![],
        }
    }

    /// Classifies a raw commit message. Messages that are not conventional
    /// commits keep their first line as the subject and no type.
    pub fn from_message(sha: &str, message: &str) -> Self {
        match ConventionalCommit::parse(message.trim_end()) {
            Ok(cc) => {
                let mut notes = vec![];

                if cc.breaking() {
                    let text = cc
                        .breaking_description()
                        .unwrap_or(cc.description())
                        .to_string();
                    notes.push(CommitNote::new(BREAKING_CHANGE_NOTE, text));
                }

                for footer in cc.footers() {
                    if footer.token().as_str().eq_ignore_ascii_case("release-as")
                    {
                        notes.push(CommitNote::new(
                            RELEASE_AS_NOTE,
                            footer.value().trim(),
                        ));
                    }
                }

                Self {
                    sha: sha.into(),
                    commit_type: cc.type_().as_str().to_lowercase(),
                    scope: cc.scope().map(|s| s.as_str().to_string()),
                    subject: cc.description().to_string(),
                    breaking: cc.breaking(),
                    notes,
                }
            }
            Err(_) => {
                let subject = message.lines().next().unwrap_or_default();
                Self::new(sha, "", subject.trim())
            }
        }
    }

    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn release_as(&self) -> Option<&str> {
        self.notes
            .iter()
            .find(|n| n.title == RELEASE_AS_NOTE)
            .map(|n| n.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_conventional_commit() {
        let commit =
            ClassifiedCommit::from_message("abc1234def", "feat(api): add endpoint");

        assert_eq!(commit.commit_type, "feat");
        assert_eq!(commit.scope.as_deref(), Some("api"));
        assert_eq!(commit.subject, "add endpoint");
        assert!(!commit.breaking);
        assert_eq!(commit.short_sha(), "abc1234");
    }

    #[test]
    fn captures_breaking_notes() {
        let commit = ClassifiedCommit::from_message(
            "abc",
            "fix!: drop old flag\n\nBREAKING CHANGE: the --old flag is gone",
        );

        assert!(commit.breaking);
        assert_eq!(commit.notes.len(), 1);
        assert_eq!(commit.notes[0].title, BREAKING_CHANGE_NOTE);
        assert_eq!(commit.notes[0].text, "the --old flag is gone");
    }

    #[test]
    fn captures_release_as_footer() {
        let commit = ClassifiedCommit::from_message(
            "abc",
            "chore: promote\n\nRelease-As: 1.0.0",
        );

        assert_eq!(commit.release_as(), Some("1.0.0"));
    }

    #[test]
    fn non_conventional_message_has_no_type() {
        let commit =
            ClassifiedCommit::from_message("abc", "Merge branch 'x'\n\nstuff");

        assert_eq!(commit.commit_type, "");
        assert_eq!(commit.subject, "Merge branch 'x'");
        assert!(commit.notes.is_empty());
    }
}
