use crate::{
    error::Result,
    manifest::{VersionsMap, parse_manifest, render_manifest},
    updater::traits::Updater,
};

/// Records released versions in the state file, keeping entries for
/// packages not part of this release.
#[derive(Debug, Clone)]
pub struct ReleaseManifestUpdater {
    pub versions: VersionsMap,
}

impl ReleaseManifestUpdater {
    pub fn new(versions: VersionsMap) -> Self {
        Self { versions }
    }
}

impl Updater for ReleaseManifestUpdater {
    fn update_content(&self, content: Option<&str>) -> Result<String> {
        let mut current = match content {
            Some(content) if !content.trim().is_empty() => {
                parse_manifest(content)?
            }
            _ => VersionsMap::new(),
        };

        for (path, version) in self.versions.iter() {
            current.insert(path.clone(), version.clone());
        }

        render_manifest(&current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn merges_into_existing_state() {
        let updater = ReleaseManifestUpdater::new(VersionsMap::from([(
            "path/b".to_string(),
            Version::new(0, 2, 4),
        )]));

        let result = updater
            .update_content(Some(r#"{"path/a": "1.0.0", "path/b": "0.2.3"}"#))
            .unwrap();

        assert_eq!(
            result,
            "{\n  \"path/a\": \"1.0.0\",\n  \"path/b\": \"0.2.4\"\n}\n"
        );
    }

    #[test]
    fn creates_missing_state_file() {
        let updater = ReleaseManifestUpdater::new(VersionsMap::from([(
            ".".to_string(),
            Version::new(0, 1, 0),
        )]));

        assert_eq!(
            updater.update_content(None).unwrap(),
            "{\n  \".\": \"0.1.0\"\n}\n"
        );
    }
}
