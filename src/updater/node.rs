//! package.json and package-lock.json updaters.
pub mod package_json;
pub mod package_lock;

pub use package_json::PackageJsonUpdater;
pub use package_lock::PackageLockUpdater;

/// Dependency maps rewritten when a sibling package changes version.
pub const DEPENDENCY_KINDS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

const UNMANAGED_PREFIXES: [&str; 7] = [
    "workspace:",
    "file:",
    "link:",
    "npm:",
    "git",
    "http:",
    "https:",
];

/// Operators that still admit the new version once it replaces the old one.
/// Upper bounds (`<`, `<=`) and strict lower bounds (`>`) would exclude it.
const INCLUSIVE_OPERATORS: [&str; 5] = ["", "^", "~", ">=", "="];

/// Rewrites a version range to point at `version`, keeping its operator
/// prefix (`^1.0.0` → `^1.1.0`). Returns `None` for specifiers that are
/// not plain ranges, such as `*` or `workspace:^`, and for ranges whose
/// operator would no longer admit `version`, such as `<2.0.0`.
pub fn replace_range(existing: &str, version: &semver::Version) -> Option<String> {
    let existing = existing.trim();

    if existing.is_empty()
        || existing == "*"
        || existing == "latest"
        || UNMANAGED_PREFIXES.iter().any(|p| existing.starts_with(p))
        || existing.contains("||")
        || existing.contains(' ')
    {
        return None;
    }

    let prefix: String = existing
        .chars()
        .take_while(|c| matches!(c, '^' | '~' | '>' | '<' | '='))
        .collect();

    if !INCLUSIVE_OPERATORS.contains(&prefix.as_str()) {
        return None;
    }

    Some(format!("{prefix}{version}"))
}
