//! Transitive version propagation across workspace members.
//!
//! A workspace plugin discovers the members of one workspace, orders them so
//! dependencies come first, and walks that order once. Members with a
//! release candidate keep their version; members that only depend on a
//! bumped sibling get a patch release of their own. Everything ecosystem
//! specific lives behind [`WorkspaceEcosystem`].
use async_trait::async_trait;
use semver::Version;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt::Debug,
    sync::Arc,
};

use crate::{
    candidate::{CandidateReleasePullRequest, VersionsMap},
    changelog::{DependencyBump, append_dependency_notes},
    config::{
        package::PackageConfig, plugin::WorkspacePluginConfig,
        release_type::ReleaseType,
    },
    error::{ReleaseGraphError, Result},
    graph::{GraphNode, build_graph, post_order},
    path_helpers::{join_path, normalize_path},
    plugins::{PluginContext, ReleasePlugin, merge::Merge},
    updater::{Update, Updater},
    versioning::BumpKind,
};

/// Member globs declared by a workspace manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// What a member manifest declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberManifest {
    pub name: String,
    pub version: Option<String>,
    /// The version is taken from the workspace manifest rather than
    /// declared by the member
    pub inherits_version: bool,
    /// Every dependency name, internal or not
    pub dependencies: Vec<String>,
}

/// Manifest formats and updaters of one package ecosystem.
pub trait WorkspaceEcosystem: Debug + Clone + Send + Sync {
    fn name(&self) -> &'static str;

    /// File name of both the workspace and member manifests
    fn manifest_file(&self) -> &'static str;

    /// Workspace-wide lock file, relative to the workspace root
    fn lock_file(&self) -> Option<&'static str>;

    /// Release type given to members that have no package entry
    fn release_type(&self) -> ReleaseType;

    /// Member patterns of the workspace manifest. A manifest without a
    /// workspace declaration, or one with no members, is a configuration
    /// error.
    fn member_patterns(&self, root_content: &str) -> Result<MemberPatterns>;

    fn parse_member(
        &self,
        manifest_path: &str,
        content: &str,
        root_content: &str,
    ) -> Result<MemberManifest>;

    /// Sets the member's own version (when given) and the versions of the
    /// listed dependencies.
    fn manifest_updater(
        &self,
        version: Option<Version>,
        dependencies: BTreeMap<String, Version>,
    ) -> Arc<dyn Updater>;

    /// Rewrites the workspace manifest itself: the shared version that
    /// inheriting members take (when given) and any dependency versions it
    /// declares. `None` when the ecosystem never touches it.
    fn root_updater(
        &self,
        shared_version: Option<Version>,
        dependencies: BTreeMap<String, Version>,
    ) -> Option<Arc<dyn Updater>>;

    /// Sets the locked version of each named member
    fn lock_updater(&self, versions: BTreeMap<String, Version>) -> Arc<dyn Updater>;
}

/// A discovered workspace member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Package directory
    pub path: String,
    pub manifest_path: String,
    pub name: String,
    pub version: Option<String>,
    pub inherits_version: bool,
    /// Names of sibling members this member depends on
    pub dependencies: Vec<String>,
    pub content: String,
}

impl Member {
    pub fn current_version(&self) -> Result<Version> {
        let raw = self.version.as_deref().unwrap_or_default();
        Version::parse(raw).map_err(|_| {
            ReleaseGraphError::InvalidPackageVersion {
                package: self.name.clone(),
                version: raw.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    pub manifest_path: String,
    pub content: String,
    /// Members keyed by declared name
    pub members: BTreeMap<String, Member>,
}

/// Workspace propagation for one ecosystem.
#[derive(Debug, Clone)]
pub struct WorkspacePlugin<E> {
    ecosystem: E,
    root: String,
    merge: bool,
}

impl<E: WorkspaceEcosystem> WorkspacePlugin<E> {
    pub fn new(ecosystem: E, config: &WorkspacePluginConfig) -> Self {
        let root = normalize_path(&config.path)
            .trim_end_matches('/')
            .to_string();

        Self {
            ecosystem,
            root: if root.is_empty() { ".".into() } else { root },
            merge: config.merge,
        }
    }

    /// Reads the workspace manifest and every member manifest.
    pub async fn discover(&self, ctx: &PluginContext<'_>) -> Result<Workspace> {
        let name = self.ecosystem.name();
        let manifest_path = join_path(&self.root, self.ecosystem.manifest_file());

        let Some(content) =
            ctx.forge.read_file(&manifest_path, ctx.base_branch).await?
        else {
            return Err(ReleaseGraphError::configuration(format!(
                "{name} plugin: workspace manifest {manifest_path} not found"
            )));
        };

        let patterns = self.ecosystem.member_patterns(&content)?;
        let dirs = self.resolve_members(&patterns, ctx).await?;

        let paths: Vec<String> = dirs
            .iter()
            .map(|(dir, _)| join_path(dir, self.ecosystem.manifest_file()))
            .collect();

        let manifests = ctx.forge.read_files(paths, ctx.base_branch).await?;

        let mut members = BTreeMap::new();
        let mut parsed = vec![];

        for ((dir, explicit), (path, member_content)) in
            dirs.into_iter().zip(manifests)
        {
            let Some(member_content) = member_content else {
                if explicit {
                    return Err(ReleaseGraphError::missing_manifest(path));
                }
                log::debug!("{name}: {dir} matched a member glob but has no manifest");
                continue;
            };

            let manifest =
                self.ecosystem.parse_member(&path, &member_content, &content)?;
            parsed.push((dir, path, member_content, manifest));
        }

        let names: HashSet<String> =
            parsed.iter().map(|(_, _, _, m)| m.name.clone()).collect();

        for (dir, path, member_content, manifest) in parsed {
            let dependencies = manifest
                .dependencies
                .into_iter()
                .filter(|dep| *dep != manifest.name && names.contains(dep))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let member = Member {
                path: dir,
                manifest_path: path,
                name: manifest.name.clone(),
                version: manifest.version,
                inherits_version: manifest.inherits_version,
                dependencies,
                content: member_content,
            };

            if let Some(existing) = members.insert(manifest.name.clone(), member) {
                return Err(ReleaseGraphError::configuration(format!(
                    "{name} plugin: package {} is declared by more than one member ({})",
                    manifest.name, existing.path
                )));
            }
        }

        log::info!("{name}: found {} workspace member(s)", members.len());

        Ok(Workspace {
            manifest_path,
            content,
            members,
        })
    }

    /// Member directories with whether each was listed explicitly.
    async fn resolve_members(
        &self,
        patterns: &MemberPatterns,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<(String, bool)>> {
        let exclude = patterns
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(&join_path(&self.root, p)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        let mut dirs = vec![];

        for pattern in patterns.include.iter() {
            let full = join_path(&self.root, pattern);

            let matches = if is_glob(&full) {
                ctx.forge
                    .list_glob(&full, ctx.base_branch)
                    .await?
                    .into_iter()
                    .map(|dir| (dir, false))
                    .collect()
            } else {
                vec![(full, true)]
            };

            for (dir, explicit) in matches {
                let dir = normalize_path(&dir).trim_end_matches('/').to_string();
                if exclude.iter().any(|p| p.matches(&dir)) {
                    log::debug!("{}: excluding {dir}", self.ecosystem.name());
                    continue;
                }
                if seen.insert(dir.clone()) {
                    dirs.push((dir, explicit));
                }
            }
        }

        Ok(dirs)
    }

    /// Propagates candidate versions through the workspace. Pure over the
    /// discovered manifests.
    pub fn propagate(
        &self,
        workspace: &Workspace,
        mut candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let graph = build_graph(workspace.members.values().map(|m| GraphNode {
            name: m.name.clone(),
            deps: m.dependencies.clone(),
            value: (),
        }));
        let order = post_order(&graph)?;

        let mut released: BTreeMap<String, (usize, Version)> = BTreeMap::new();
        for (index, candidate) in candidates.iter().enumerate() {
            for (path, version) in candidate.released_versions() {
                released.insert(path, (index, version));
            }
        }

        // declared name -> version this run releases
        let mut versions = VersionsMap::new();
        let mut touched: Vec<usize> = vec![];
        let mut created = vec![];

        for name in order.iter() {
            let Some(member) = workspace.members.get(name) else {
                continue;
            };

            let bumps: Vec<DependencyBump> = member
                .dependencies
                .iter()
                .filter_map(|dep| {
                    versions.get(dep).map(|to| DependencyBump {
                        name: dep.clone(),
                        from: workspace
                            .members
                            .get(dep)
                            .and_then(|m| m.current_version().ok()),
                        to: to.clone(),
                    })
                })
                .collect();

            if let Some((index, version)) = released.get(&member.path) {
                versions.insert(name.clone(), version.clone());

                let update = self.member_update(member, version, &versions)?;
                let candidate = &mut candidates[*index];
                candidate.pull_request.updates.extend(update);
                if let Some(release) = candidate.pull_request.release_mut(&member.path)
                    && !bumps.is_empty()
                {
                    release.notes = append_dependency_notes(&release.notes, &bumps);
                }
                if !touched.contains(index) {
                    touched.push(*index);
                }
            } else if !bumps.is_empty() {
                let current = member.current_version()?;
                let next = BumpKind::Patch.apply(&current);
                versions.insert(name.clone(), next.clone());

                log::info!(
                    "{}: {name} {current} -> {next} for updated dependencies",
                    self.ecosystem.name()
                );

                let updates = self
                    .member_update(member, &next, &versions)?
                    .into_iter()
                    .collect();

                let package = self.package_for(member, ctx);
                created.push(ctx.builder.build_dependency_bump(
                    &package, &current, &next, &bumps, updates,
                )?);
            }
        }

        if versions.is_empty() {
            log::debug!("{}: no workspace member is released", self.ecosystem.name());
            return Ok(candidates);
        }

        ctx.checkpoint.success(&format!(
            "{}: {} released, {} bumped for dependencies",
            self.ecosystem.name(),
            touched.len(),
            created.len()
        ));

        let shared = self.workspace_updates(workspace, &versions)?;

        let mut result = vec![];
        let mut members = vec![];
        let mut slot = None;

        for (index, candidate) in candidates.into_iter().enumerate() {
            if touched.contains(&index) {
                slot.get_or_insert(result.len());
                members.push(candidate);
            } else {
                result.push(candidate);
            }
        }
        members.extend(created);

        for (position, candidate) in members.iter_mut().enumerate() {
            // merged members share one copy of the workspace-wide files
            if self.merge && position > 0 {
                break;
            }
            candidate.pull_request.updates.extend(shared.iter().cloned());
        }

        if self.merge {
            members = Merge::new()
                .with_title_pattern(
                    ctx.builder.config().pull_request_title_pattern.clone(),
                )
                .merge(members, ctx.base_branch);
        }

        let at = slot.unwrap_or(result.len());
        let tail = result.split_off(at);
        result.extend(members);
        result.extend(tail);

        Ok(result)
    }

    /// Manifest rewrite for a member, or nothing when the text would not
    /// change.
    fn member_update(
        &self,
        member: &Member,
        version: &Version,
        versions: &VersionsMap,
    ) -> Result<Option<Update>> {
        let dependencies: BTreeMap<String, Version> = member
            .dependencies
            .iter()
            .filter_map(|dep| versions.get(dep).map(|v| (dep.clone(), v.clone())))
            .collect();

        let updater = self
            .ecosystem
            .manifest_updater(Some(version.clone()), dependencies);

        changed_update(&member.manifest_path, &member.content, updater)
    }

    /// Workspace manifest and lock file rewrites.
    fn workspace_updates(
        &self,
        workspace: &Workspace,
        versions: &VersionsMap,
    ) -> Result<Vec<Update>> {
        let mut updates = vec![];
        let shared_version = self.shared_version(workspace, versions)?;

        if let Some(updater) =
            self.ecosystem.root_updater(shared_version, versions.clone())
            && let Some(update) =
                changed_update(&workspace.manifest_path, &workspace.content, updater)?
        {
            updates.push(update);
        }

        if let Some(lock_file) = self.ecosystem.lock_file() {
            updates.push(Update::shared(
                join_path(&self.root, lock_file),
                false,
                self.ecosystem.lock_updater(versions.clone()),
            ));
        }

        Ok(updates)
    }

    /// Version the workspace manifest must carry once this run's releases
    /// land, when any member that inherits it is released. Inheriting
    /// members that would end up on different versions cannot share one
    /// field, so that is rejected.
    fn shared_version(
        &self,
        workspace: &Workspace,
        versions: &VersionsMap,
    ) -> Result<Option<Version>> {
        let mut outcome: BTreeMap<Version, Vec<&str>> = BTreeMap::new();
        let mut released = false;

        for member in workspace.members.values().filter(|m| m.inherits_version) {
            let version = match versions.get(&member.name) {
                Some(next) => {
                    released = true;
                    next.clone()
                }
                None => member.current_version()?,
            };
            outcome.entry(version).or_default().push(member.name.as_str());
        }

        if !released {
            return Ok(None);
        }

        if outcome.len() > 1 {
            let detail = outcome
                .iter()
                .map(|(version, names)| format!("{} at {version}", names.join(", ")))
                .collect::<Vec<_>>()
                .join("; ");

            return Err(ReleaseGraphError::configuration(format!(
                "{} plugin: members inheriting the workspace version would diverge ({detail}); release them together with a linked-versions group",
                self.ecosystem.name()
            )));
        }

        Ok(outcome.into_keys().next())
    }

    fn package_for(&self, member: &Member, ctx: &PluginContext<'_>) -> PackageConfig {
        ctx.package(&member.path).cloned().unwrap_or_else(|| PackageConfig {
            path: member.path.clone(),
            component: Some(member.name.clone()),
            package_name: Some(member.name.clone()),
            release_type: self.ecosystem.release_type(),
            ..PackageConfig::default()
        })
    }
}

fn changed_update(
    path: &str,
    content: &str,
    updater: Arc<dyn Updater>,
) -> Result<Option<Update>> {
    let updated = updater.update_content(Some(content))?;

    if updated == content {
        log::debug!("{path}: unchanged, skipping");
        return Ok(None);
    }

    Ok(Some(Update::shared(path, false, updater)))
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[async_trait]
impl<E: WorkspaceEcosystem + 'static> ReleasePlugin for WorkspacePlugin<E> {
    async fn run(
        &self,
        candidates: Vec<CandidateReleasePullRequest>,
        ctx: &PluginContext<'_>,
    ) -> Result<Vec<CandidateReleasePullRequest>> {
        let workspace = self.discover(ctx).await?;
        self.propagate(&workspace, candidates, ctx)
    }
}
