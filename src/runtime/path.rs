//! Path utility functions for normalization, comparison and expansion.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
///
/// `/usr/local/bin/../../../etc/passwd` is NOT under `/usr/local`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// True if both paths name the same location after lexical normalization.
pub fn same_path(a: &Path, b: &Path) -> bool {
    normalize_path(a) == normalize_path(b)
}

/// Calculate the relative path from a symlink location to a target.
///
/// A link at `/project/vendor/acme/foo` pointing to `/work/foo` becomes
/// `../../../work/foo`. Returns `None` if no relative path exists
/// (e.g., different drive letters on Windows).
pub fn relative_symlink_path(from_link: &Path, to_target: &Path) -> Option<PathBuf> {
    let from_dir = from_link.parent()?;
    let result = pathdiff::diff_paths(to_target, from_dir)?;

    if result.is_absolute() {
        return None;
    }

    Some(result)
}

/// Resolve a relative path against a base directory to get an absolute path.
pub fn resolve_relative_path(base_dir: &Path, relative_path: &Path) -> PathBuf {
    if relative_path.is_absolute() {
        normalize_path(relative_path)
    } else {
        normalize_path(&base_dir.join(relative_path))
    }
}

fn has_wildcard(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Expand a user supplied path into absolute, normalized directory paths.
///
/// Relative input is resolved against `cwd`. Input containing glob
/// metacharacters is matched against the filesystem and only directories are
/// kept; the result is sorted. Plain input yields exactly one path whether it
/// exists or not, so the caller can report a missing manifest for it.
#[tracing::instrument]
pub fn expand_paths(cwd: &Path, input: &str) -> Result<Vec<PathBuf>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Empty path");
    }

    let resolved = resolve_relative_path(cwd, Path::new(trimmed));
    if !has_wildcard(trimmed) {
        return Ok(vec![resolved]);
    }

    let pattern = resolved.to_string_lossy().into_owned();
    let mut matches = Vec::new();
    let entries =
        glob::glob(&pattern).with_context(|| format!("Invalid path pattern '{}'", input))?;
    for entry in entries {
        let path = entry.with_context(|| format!("Failed to expand '{}'", input))?;
        if path.is_dir() {
            matches.push(normalize_path(&path));
        }
    }
    matches.sort();
    matches.dedup();
    log::debug!("Expanded {:?} to {} path(s)", input, matches.len());
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path_with_dot() {
        assert_eq!(
            normalize_path(Path::new("/usr/./local/./bin")),
            PathBuf::from("/usr/local/bin")
        );
    }

    #[test]
    fn test_normalize_path_mixed_components() {
        assert_eq!(
            normalize_path(Path::new("/usr/./local/../bin/./tool")),
            PathBuf::from("/usr/bin/tool")
        );
    }

    #[test]
    fn test_normalize_path_relative() {
        assert_eq!(
            normalize_path(Path::new("foo/bar/../baz")),
            PathBuf::from("foo/baz")
        );
    }

    #[test]
    fn test_normalize_path_only_dots() {
        assert_eq!(normalize_path(Path::new("./././.")), PathBuf::from(""));
    }

    #[test]
    fn test_is_path_under_partial_component_match() {
        assert!(!is_path_under(
            Path::new("/usr/local-extra/bin"),
            Path::new("/usr/local")
        ));
    }

    #[test]
    fn test_is_path_under_directory_traversal() {
        assert!(!is_path_under(
            Path::new("/usr/local/bin/../../../etc/passwd"),
            Path::new("/usr/local")
        ));
        assert!(is_path_under(
            Path::new("/usr/local/bin/../lib/file"),
            Path::new("/usr/local")
        ));
    }

    #[test]
    fn test_same_path_ignores_dot_components() {
        assert!(same_path(
            Path::new("/work/./foo"),
            Path::new("/work/bar/../foo")
        ));
        assert!(!same_path(Path::new("/work/foo"), Path::new("/work/foo2")));
    }

    #[test]
    fn test_relative_symlink_path_into_vendor() {
        let result = relative_symlink_path(
            Path::new("/project/vendor/acme/foo"),
            Path::new("/project/packages/foo"),
        );
        assert_eq!(result, Some(PathBuf::from("../../packages/foo")));
    }

    #[cfg(windows)]
    #[test]
    fn test_relative_symlink_path_windows_different_drives() {
        let result = relative_symlink_path(
            Path::new("C:\\project\\vendor\\acme\\foo"),
            Path::new("D:\\work\\foo"),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_relative_path(Path::new("/home/user/project"), Path::new("../foo")),
            PathBuf::from("/home/user/foo")
        );
        assert_eq!(
            resolve_relative_path(Path::new("/home/user/project"), Path::new("/work/./foo")),
            PathBuf::from("/work/foo")
        );
    }

    #[test]
    fn test_expand_plain_path_is_resolved_not_checked() {
        let paths = expand_paths(Path::new("/home/user/project"), "../missing").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/home/user/missing")]);
    }

    #[test]
    fn test_expand_empty_path_fails() {
        assert!(expand_paths(Path::new("/tmp"), "  ").is_err());
    }

    #[test]
    fn test_expand_wildcard_keeps_directories_sorted() {
        let dir = tempdir().unwrap();
        let packages = dir.path().join("packages");
        std::fs::create_dir_all(packages.join("beta")).unwrap();
        std::fs::create_dir_all(packages.join("alpha")).unwrap();
        std::fs::write(packages.join("README.md"), "not a package").unwrap();

        let paths = expand_paths(dir.path(), "packages/*").unwrap();
        assert_eq!(paths, vec![packages.join("alpha"), packages.join("beta")]);
    }

    #[test]
    fn test_expand_wildcard_without_matches_is_empty() {
        let dir = tempdir().unwrap();
        let paths = expand_paths(dir.path(), "nothing-here/*").unwrap();
        assert!(paths.is_empty());
    }
}
