use std::{fmt::Debug, sync::Arc};

use crate::error::Result;

/// Capability to compute a file's new content from its old content.
///
/// `content` is `None` when the file does not exist yet; updaters that can
/// create their file from scratch (changelogs, state files) handle that case,
/// others treat it as empty.
pub trait Updater: Debug + Send + Sync {
    fn update_content(&self, content: Option<&str>) -> Result<String>;
}

/// A scheduled edit of a single repository file.
#[derive(Debug, Clone)]
pub struct Update {
    /// Path relative to the repository root
    pub path: String,
    /// Whether the file may be created when it does not exist
    pub create_if_missing: bool,
    pub updater: Arc<dyn Updater>,
}

impl Update {
    pub fn new(
        path: impl Into<String>,
        create_if_missing: bool,
        updater: impl Updater + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
            updater: Arc::new(updater),
        }
    }

    pub fn shared(
        path: impl Into<String>,
        create_if_missing: bool,
        updater: Arc<dyn Updater>,
    ) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
            updater,
        }
    }
}
