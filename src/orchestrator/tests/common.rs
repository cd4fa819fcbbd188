//! Common test utilities for orchestrator tests.
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::{
    candidate::VersionsMap,
    checkpoint::{Checkpoint, RecordingCheckpoint},
    config::{
        Config,
        package::{PackageConfig, PackageConfigBuilder},
        release_type::ReleaseType,
    },
    orchestrator::ManifestOrchestrator,
    test_helpers::{InMemoryForge, test_date},
    versioning::ClassifiedCommit,
};

pub use crate::test_helpers::commit;
pub use semver::Version;

pub fn simple_package(path: &str, component: &str) -> PackageConfig {
    PackageConfigBuilder::default()
        .path(path)
        .component(component)
        .release_type(ReleaseType::Simple)
        .build()
        .unwrap()
}

/// `path/a` (pkg1), `path/b` (pkg2) and `path/c` (pkg3).
pub fn three_packages() -> Vec<PackageConfig> {
    vec![
        simple_package("path/a", "pkg1"),
        simple_package("path/b", "pkg2"),
        simple_package("path/c", "pkg3"),
    ]
}

pub fn versions(entries: &[(&str, &str)]) -> VersionsMap {
    entries
        .iter()
        .map(|(path, version)| (path.to_string(), Version::parse(version).unwrap()))
        .collect()
}

pub fn commits(
    entries: Vec<(&str, Vec<ClassifiedCommit>)>,
) -> BTreeMap<String, Vec<ClassifiedCommit>> {
    entries
        .into_iter()
        .map(|(path, commits)| (path.to_string(), commits))
        .collect()
}

pub struct TestOrchestrator {
    pub orchestrator: ManifestOrchestrator,
    pub forge: InMemoryForge,
    pub checkpoint: Arc<RecordingCheckpoint>,
    pub cancel: CancellationToken,
}

/// Builds an orchestrator over an in-memory forge seeded with `files`.
pub fn create_test_orchestrator(
    config: Config,
    files: &[(&str, &str)],
) -> TestOrchestrator {
    let forge = InMemoryForge::default();
    for (path, content) in files {
        forge.set_file(path, content);
    }

    let checkpoint = Arc::new(RecordingCheckpoint::default());
    let cancel = CancellationToken::new();

    let orchestrator = ManifestOrchestrator::builder()
        .config(Arc::new(config))
        .forge(Arc::new(forge.manager()))
        .checkpoint(Arc::clone(&checkpoint) as Arc<dyn Checkpoint>)
        .cancel(cancel.clone())
        .date(test_date())
        .build()
        .unwrap();

    TestOrchestrator {
        orchestrator,
        forge,
        checkpoint,
        cancel,
    }
}
