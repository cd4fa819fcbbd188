use serde::{Deserialize, Serialize};

use crate::error::{ReleaseGraphError, Result};

fn default_true() -> bool {
    true
}

/// Options shared by the workspace propagator plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePluginConfig {
    /// Combine every workspace candidate into a single pull request
    #[serde(default = "default_true")]
    pub merge: bool,
    /// Workspace root relative to the repository root
    #[serde(default = "default_root")]
    pub path: String,
}

fn default_root() -> String {
    ".".into()
}

impl Default for WorkspacePluginConfig {
    fn default() -> Self {
        Self {
            merge: true,
            path: default_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedVersionsConfig {
    pub group_name: String,
    /// Component names that always release with the same version
    pub components: Vec<String>,
    #[serde(default = "default_true")]
    pub merge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceCaseConfig {
    /// Words left untouched when capitalizing commit subjects
    #[serde(default)]
    pub special_words: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPriorityConfig {
    /// Group names in priority order. Only the highest priority group
    /// with candidates is released.
    pub groups: Vec<String>,
}

/// Plugins run in declaration order over the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PluginConfig {
    CargoWorkspace(WorkspacePluginConfig),
    NodeWorkspace(WorkspacePluginConfig),
    LinkedVersions(LinkedVersionsConfig),
    SentenceCase(SentenceCaseConfig),
    GroupPriority(GroupPriorityConfig),
}

impl PluginConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            PluginConfig::LinkedVersions(config) => {
                if config.group_name.trim().is_empty() {
                    return Err(ReleaseGraphError::configuration(
                        "linked-versions plugin requires group_name",
                    ));
                }
                if config.components.is_empty() {
                    return Err(ReleaseGraphError::configuration(format!(
                        "linked-versions group {} has no components",
                        config.group_name
                    )));
                }
                Ok(())
            }
            PluginConfig::GroupPriority(config) if config.groups.is_empty() => {
                Err(ReleaseGraphError::configuration(
                    "group-priority plugin requires at least one group",
                ))
            }
            _ => Ok(()),
        }
    }
}
