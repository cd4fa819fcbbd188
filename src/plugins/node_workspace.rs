//! npm workspaces: the `workspaces` field of the root package.json and a
//! shared package-lock.json.
use semver::Version;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    config::release_type::ReleaseType,
    error::{ReleaseGraphError, Result},
    plugins::workspace::{MemberManifest, MemberPatterns, WorkspaceEcosystem},
    updater::{
        Updater,
        node::{
            DEPENDENCY_KINDS, package_json::PackageJsonUpdater,
            package_lock::PackageLockUpdater,
        },
    },
};

/// `"workspaces": [...]` or `"workspaces": { "packages": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Workspaces {
    List(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    fn into_patterns(self) -> Vec<String> {
        match self {
            Workspaces::List(patterns) => patterns,
            Workspaces::Object { packages } => packages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RootPackage {
    workspaces: Option<Workspaces>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeWorkspace;

impl WorkspaceEcosystem for NodeWorkspace {
    fn name(&self) -> &'static str {
        "node-workspace"
    }

    fn manifest_file(&self) -> &'static str {
        "package.json"
    }

    fn lock_file(&self) -> Option<&'static str> {
        Some("package-lock.json")
    }

    fn release_type(&self) -> ReleaseType {
        ReleaseType::Node
    }

    fn member_patterns(&self, root_content: &str) -> Result<MemberPatterns> {
        let root: RootPackage = serde_json::from_str(root_content)?;

        let Some(workspaces) = root.workspaces else {
            return Err(ReleaseGraphError::configuration(
                "node-workspace plugin: package.json has no workspaces field",
            ));
        };

        let (exclude, include): (Vec<String>, Vec<String>) = workspaces
            .into_patterns()
            .into_iter()
            .partition(|p| p.starts_with('!'));

        if include.is_empty() {
            return Err(ReleaseGraphError::configuration(
                "node-workspace plugin: workspaces declares no packages",
            ));
        }

        Ok(MemberPatterns {
            include,
            exclude: exclude
                .into_iter()
                .map(|p| p.trim_start_matches('!').to_string())
                .collect(),
        })
    }

    fn parse_member(
        &self,
        manifest_path: &str,
        content: &str,
        _root_content: &str,
    ) -> Result<MemberManifest> {
        let doc: Value = serde_json::from_str(content).map_err(|err| {
            log::warn!("failed to parse {manifest_path}: {err}");
            ReleaseGraphError::missing_manifest(manifest_path)
        })?;

        let Some(name) = doc.get("name").and_then(Value::as_str) else {
            return Err(ReleaseGraphError::unnamed_package(manifest_path));
        };

        let version = doc
            .get("version")
            .and_then(Value::as_str)
            .map(String::from);

        let dependencies = DEPENDENCY_KINDS
            .iter()
            .filter_map(|kind| doc.get(*kind).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect();

        Ok(MemberManifest {
            name: name.to_string(),
            version,
            inherits_version: false,
            dependencies,
        })
    }

    fn manifest_updater(
        &self,
        version: Option<Version>,
        dependencies: BTreeMap<String, Version>,
    ) -> Arc<dyn Updater> {
        Arc::new(PackageJsonUpdater {
            version,
            dependency_versions: dependencies,
        })
    }

    fn root_updater(
        &self,
        _shared_version: Option<Version>,
        _dependencies: BTreeMap<String, Version>,
    ) -> Option<Arc<dyn Updater>> {
        // the root package.json is reformatted by any rewrite, so it is left
        // to the lock file
        None
    }

    fn lock_updater(&self, versions: BTreeMap<String, Version>) -> Arc<dyn Updater> {
        Arc::new(PackageLockUpdater::new(versions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{
            Config, package::PackageConfigBuilder, plugin::WorkspacePluginConfig,
        },
        plugins::workspace::WorkspacePlugin,
        test_helpers::{PluginHarness, commit},
    };
    use serde_json::json;

    fn package_json(name: &str, version: &str, deps: &[(&str, &str)]) -> String {
        let deps: serde_json::Map<String, Value> = deps
            .iter()
            .map(|(n, v)| (n.to_string(), json!(v)))
            .collect();

        let mut doc = json!({ "name": name, "version": version });
        if !deps.is_empty() {
            doc["dependencies"] = Value::Object(deps);
        }

        let mut out = serde_json::to_string_pretty(&doc).unwrap();
        out.push('\n');
        out
    }

    /// Chain a <- b <- c <- d with e standing alone.
    fn harness() -> PluginHarness {
        let harness = PluginHarness::new(
            Config {
                packages: vec![
                    PackageConfigBuilder::default()
                        .path("packages/a")
                        .component("a")
                        .release_type(ReleaseType::Node)
                        .build()
                        .unwrap(),
                ],
                ..Config::default()
            },
            &[("packages/a", "1.0.0")],
        );

        harness.forge.set_file(
            "package.json",
            &serde_json::to_string_pretty(&json!({
                "name": "root",
                "private": true,
                "workspaces": { "packages": ["packages/*", "!packages/skipped"] }
            }))
            .unwrap(),
        );
        harness.forge.set_file(
            "package-lock.json",
            &serde_json::to_string_pretty(&json!({
                "name": "root",
                "lockfileVersion": 3,
                "packages": {
                    "": { "name": "root", "workspaces": ["packages/*"] },
                    "packages/a": { "name": "a", "version": "1.0.0" },
                    "packages/b": { "name": "b", "version": "2.0.0" },
                    "node_modules/a": { "resolved": "packages/a", "link": true },
                    "node_modules/left-pad": { "version": "1.3.0", "resolved": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz" }
                }
            }))
            .unwrap(),
        );

        let files = [
            ("packages/a/package.json", package_json("a", "1.0.0", &[("left-pad", "^1.3.0")])),
            ("packages/b/package.json", package_json("b", "2.0.0", &[("a", "^1.0.0")])),
            ("packages/c/package.json", package_json("c", "0.3.0", &[("b", "~2.0.0")])),
            ("packages/d/package.json", package_json("d", "0.0.1", &[("c", "0.3.0")])),
            ("packages/e/package.json", package_json("e", "5.0.0", &[])),
            ("packages/skipped/package.json", package_json("skipped", "1.0.0", &[("a", "^1.0.0")])),
        ];
        for (path, content) in files.iter() {
            harness.forge.set_file(path, content);
        }

        harness
    }

    fn plugin(merge: bool) -> WorkspacePlugin<NodeWorkspace> {
        WorkspacePlugin::new(
            NodeWorkspace,
            &WorkspacePluginConfig {
                merge,
                path: ".".into(),
            },
        )
    }

    #[tokio::test]
    async fn propagation_reaches_transitive_dependents() {
        let mut harness = harness();
        harness.commits("packages/a", vec![commit("feat", "new option")]);

        let candidates = harness.candidates().unwrap();
        let result = harness.run(&plugin(false), candidates).await.unwrap();

        let released: Vec<(&str, String)> = result
            .iter()
            .map(|c| (c.path.as_str(), c.version().unwrap().to_string()))
            .collect();

        assert_eq!(
            released,
            vec![
                ("packages/a", "1.1.0".to_string()),
                ("packages/b", "2.0.1".to_string()),
                ("packages/c", "0.3.1".to_string()),
                ("packages/d", "0.0.2".to_string()),
            ]
        );

        let d = harness.materialize(&result[3]).await;
        let manifest: Value = serde_json::from_str(&d["packages/d/package.json"]).unwrap();
        assert_eq!(manifest["version"], "0.0.2");
        assert_eq!(manifest["dependencies"]["c"], "0.3.1");

        let c = harness.materialize(&result[2]).await;
        let manifest: Value = serde_json::from_str(&c["packages/c/package.json"]).unwrap();
        assert_eq!(manifest["dependencies"]["b"], "~2.0.1");
    }

    #[tokio::test]
    async fn unrelated_sibling_is_not_touched() {
        let mut harness = harness();
        harness.commits("packages/a", vec![commit("fix", "edge case")]);

        let candidates = harness.candidates().unwrap();
        let result = harness.run(&plugin(true), candidates).await.unwrap();

        assert_eq!(result.len(), 1);
        let files = harness.materialize(&result[0]).await;

        assert!(!files.contains_key("packages/e/package.json"));
        assert!(!files.contains_key("packages/skipped/package.json"));

        let lock: Value = serde_json::from_str(&files["package-lock.json"]).unwrap();
        assert_eq!(lock["packages"]["packages/a"]["version"], "1.0.1");
        assert_eq!(lock["packages"]["packages/b"]["version"], "2.0.1");
        assert_eq!(lock["packages"]["node_modules/left-pad"]["version"], "1.3.0");
    }

    #[test]
    fn workspaces_accepts_array_form() {
        let patterns = NodeWorkspace
            .member_patterns(r#"{"workspaces": ["apps/*", "libs/core"]}"#)
            .unwrap();
        assert_eq!(patterns.include, vec!["apps/*", "libs/core"]);
        assert!(patterns.exclude.is_empty());
    }

    #[test]
    fn missing_workspaces_is_a_configuration_error() {
        let err = NodeWorkspace
            .member_patterns(r#"{"name": "solo"}"#)
            .unwrap_err();
        assert!(matches!(err, ReleaseGraphError::Configuration(_)));
    }

    #[test]
    fn unnamed_member_is_fatal() {
        let err = NodeWorkspace
            .parse_member("packages/x/package.json", r#"{"version": "1.0.0"}"#, "{}")
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseGraphError::UnnamedPackage { ref path } if path == "packages/x/package.json"
        ));
    }

    #[tokio::test]
    async fn cycle_between_members_is_fatal() {
        let mut harness = harness();
        harness.forge.set_file(
            "packages/a/package.json",
            &package_json("a", "1.0.0", &[("d", "^0.0.1")]),
        );
        harness.commits("packages/a", vec![commit("fix", "loop")]);

        let candidates = harness.candidates().unwrap();
        let err = harness.run(&plugin(false), candidates).await.unwrap_err();

        match err {
            ReleaseGraphError::Cycle { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"a".to_string()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }
}
