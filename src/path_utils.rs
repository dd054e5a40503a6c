//! Path conversions between runner platforms.

use std::path::{Component, Path, PathBuf};

/// Replace backslashes with forward slashes.
#[must_use]
pub fn to_posix_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Replace forward slashes with backslashes.
#[must_use]
pub fn to_win32_path(path: &str) -> String {
    path.replace('/', "\\")
}

/// Separators for the platform this binary runs on.
#[must_use]
pub fn to_platform_path(path: &str) -> String {
    if cfg!(windows) {
        to_win32_path(path)
    } else {
        to_posix_path(path)
    }
}

/// Expand a leading `~`, make absolute, and resolve `.`/`..`.
///
/// Symlinks are resolved when the path exists; otherwise the path is
/// cleaned lexically.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };
    std::fs::canonicalize(&absolute).unwrap_or_else(|_| lexical_clean(&absolute))
}

fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Resolve `.` and `..` without touching the filesystem.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[must_use]
pub fn is_absolute(path: &Path) -> bool {
    path.is_absolute()
}

/// `target` relative to `base`.
///
/// When `target` is not under `base`, returns `target` with its root
/// stripped, using forward slashes.
#[must_use]
pub fn relative_path(target: &Path, base: &Path) -> String {
    let t = normalize_path(target);
    let b = normalize_path(base);
    match t.strip_prefix(&b) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => {
            let parts: Vec<String> = t
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            parts.join("/")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn posix_and_win32_conversion() {
        assert_eq!(to_posix_path(r"C:\Users\test\file.txt"), "C:/Users/test/file.txt");
        assert_eq!(to_posix_path("/home/user/file.txt"), "/home/user/file.txt");
        assert_eq!(to_win32_path("/home/user/file.txt"), r"\home\user\file.txt");
        assert_eq!(to_win32_path("relative/path/file.txt"), r"relative\path\file.txt");
        assert_eq!(to_win32_path(r"C:\Users\test"), r"C:\Users\test");
    }

    #[cfg(unix)]
    #[test]
    fn platform_path_on_unix() {
        assert_eq!(to_platform_path(r"a\b\c"), "a/b/c");
    }

    #[cfg(unix)]
    #[test]
    fn lexical_clean_resolves_dots() {
        assert_eq!(lexical_clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(lexical_clean(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(lexical_clean(Path::new("../x")), PathBuf::from("../x"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_nonexistent_path_is_absolute_and_clean() {
        let p = normalize_path(Path::new("/definitely/not/../here"));
        assert_eq!(p, PathBuf::from("/definitely/here"));
    }

    #[test]
    fn normalize_expands_home() {
        if let Some(home) = dirs::home_dir() {
            let p = normalize_path(Path::new("~"));
            assert_eq!(p, std::fs::canonicalize(&home).unwrap_or(home));
        }
    }

    #[test]
    fn relative_path_under_base() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let rel = relative_path(&nested, dir.path());
        assert_eq!(to_posix_path(&rel), "a/b");
    }

    #[cfg(unix)]
    #[test]
    fn relative_path_outside_base_strips_root() {
        assert_eq!(
            relative_path(Path::new("/nonexistent-x/y"), Path::new("/nonexistent-z")),
            "nonexistent-x/y"
        );
    }

    #[test]
    fn absolute_check() {
        assert!(!is_absolute(Path::new("relative/path")));
        #[cfg(unix)]
        assert!(is_absolute(Path::new("/home/user")));
    }
}
