use std::{borrow::Cow, path::Path};

use crate::config::package::PackageConfig;

/// Normalizes a path by replacing backslashes with forward slashes and
/// stripping leading/embedded "./" segments. Borrows when already clean.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.contains('\\') || path.starts_with("./") || path.contains("/./")
    {
        let replaced = path.replace('\\', "/");
        let cleaned = replaced
            .split('/')
            .filter(|segment| *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        Cow::Owned(cleaned)
    } else {
        Cow::Borrowed(path)
    }
}

/// Joins a repository-relative directory and a file, treating "." and ""
/// as the repository root.
pub fn join_path(dir: &str, file: &str) -> String {
    let dir = normalize_path(dir);
    let dir = dir.trim_end_matches('/');

    if dir.is_empty() || dir == "." {
        return normalize_path(file).into_owned();
    }

    Path::new(dir)
        .join(file)
        .display()
        .to_string()
        .replace('\\', "/")
}

/// Path of a file inside a package, or the package directory itself.
pub fn package_path(package: &PackageConfig, file: Option<&str>) -> String {
    match file {
        Some(file) => join_path(&package.path, file),
        None => normalize_path(&package.path).into_owned(),
    }
}

/// Parent directory of a repository-relative file path ("." for root files).
pub fn parent_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::package::PackageConfigBuilder;

    fn create_test_package(path: &str) -> PackageConfig {
        PackageConfigBuilder::default().path(path).build().unwrap()
    }

    #[test]
    fn package_path_returns_package_directory() {
        let pkg = create_test_package("packages/my-app");
        assert_eq!(package_path(&pkg, None), "packages/my-app");
    }

    #[test]
    fn package_path_joins_file_to_package_directory() {
        let pkg = create_test_package("packages/my-app");
        let result = package_path(&pkg, Some("package.json"));
        assert_eq!(result, "packages/my-app/package.json");
    }

    #[test]
    fn package_path_handles_root_package() {
        let pkg = create_test_package(".");
        assert_eq!(package_path(&pkg, Some("Cargo.toml")), "Cargo.toml");
    }

    #[test]
    fn join_path_strips_trailing_slash() {
        assert_eq!(join_path("crates/core/", "Cargo.toml"), "crates/core/Cargo.toml");
        assert_eq!(join_path("", "Cargo.lock"), "Cargo.lock");
    }

    #[test]
    fn parent_dir_of_nested_and_root_files() {
        assert_eq!(parent_dir("crates/core/Cargo.toml"), "crates/core");
        assert_eq!(parent_dir("Cargo.toml"), ".");
    }

    #[test]
    fn normalize_path_returns_borrowed_for_clean_unix_paths() {
        let result = normalize_path("src/main.rs");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "src/main.rs");
    }

    #[test]
    fn normalize_path_normalizes_windows_paths() {
        let result = normalize_path("src\\main.rs");
        assert!(matches!(result, Cow::Owned(_)));
        assert_eq!(result, "src/main.rs");
    }

    #[test]
    fn normalize_path_removes_dot_segments() {
        assert_eq!(normalize_path("./src/main.rs"), "src/main.rs");
        assert_eq!(
            normalize_path("packages/./api/src/main.rs"),
            "packages/api/src/main.rs"
        );
        assert_eq!(normalize_path(".\\packages\\.\\api"), "packages/api");
    }
}
