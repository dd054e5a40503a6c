//! Filesystem helpers for action steps: copy, move, remove, `which`, and friends.
//!
//! Entry-type checks use `symlink_metadata()` so a symlink is removed or
//! copied as a link, never by following it into its target.

mod file_stat;

pub use file_stat::{FileKind, FileStat};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::env::{iter_env_path, Environment, ProcessEnv};
use crate::errors::{Result, ToolkitError};
use crate::path_utils::normalize_path;

static SYMBOLIC_PERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([r-][w-][x-]){3}$").expect("permission regex"));

fn fs_err(message: impl Into<String>) -> ToolkitError {
    ToolkitError::Fs {
        message: message.into(),
    }
}

fn is_regular_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

fn exists_no_follow(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOptions {
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    pub recursive: bool,
    /// Ignore missing paths and removal failures.
    pub force: bool,
}

/// Copy a file or directory tree.
///
/// An existing `dst` is left untouched unless `overwrite` is set. Copying a
/// file onto an existing directory is refused.
///
/// # Errors
///
/// Returns [`ToolkitError::Fs`] when `src` is missing or the copy would
/// replace a directory with a file.
pub fn copy(src: &Path, dst: &Path, opts: CopyOptions) -> Result<PathBuf> {
    if !exists_no_follow(src) {
        return Err(fs_err(format!("source not found: {}", src.display())));
    }
    if exists_no_follow(dst) {
        if !opts.overwrite {
            tracing::debug!(dst = %dst.display(), "copy target exists, skipping");
            return Ok(dst.to_path_buf());
        }
        if is_regular_dir(dst) && !is_regular_dir(src) {
            return Err(fs_err(format!(
                "cannot overwrite directory {} with a file",
                dst.display()
            )));
        }
        remove(
            dst,
            RemoveOptions {
                recursive: true,
                force: false,
            },
        )?;
    }
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if is_regular_dir(src) {
        copy_tree(src, dst)?;
    } else {
        copy_entry(src, dst)?;
    }
    Ok(dst.to_path_buf())
}

fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    let meta = src.symlink_metadata()?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(src)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, dst)?;
        #[cfg(not(unix))]
        {
            let _ = target;
            fs::copy(src, dst)?;
        }
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| fs_err(format!("walking {}: {e}", src.display())))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| fs_err(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_entry(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Rename `src` to `dst`, falling back to copy-and-delete across devices.
///
/// # Errors
///
/// Returns [`ToolkitError::Fs`] when `src` is missing or `dst` exists and
/// `overwrite` is false.
pub fn move_path(src: &Path, dst: &Path, overwrite: bool) -> Result<PathBuf> {
    if !exists_no_follow(src) {
        return Err(fs_err(format!("source not found: {}", src.display())));
    }
    if exists_no_follow(dst) {
        if !overwrite {
            return Err(fs_err(format!("destination exists: {}", dst.display())));
        }
        remove(
            dst,
            RemoveOptions {
                recursive: true,
                force: true,
            },
        )?;
    }
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if let Err(e) = fs::rename(src, dst) {
        tracing::debug!(error = %e, "rename failed, copying instead");
        copy(src, dst, CopyOptions { overwrite: true })?;
        remove(
            src,
            RemoveOptions {
                recursive: true,
                force: false,
            },
        )?;
    }
    Ok(dst.to_path_buf())
}

/// Delete a file, symlink, or directory.
///
/// # Errors
///
/// Without `force`, a missing path or failed removal is an error. Removing a
/// non-empty directory requires `recursive`.
pub fn remove(path: &Path, opts: RemoveOptions) -> Result<()> {
    let meta = match path.symlink_metadata() {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && opts.force => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let result = if meta.file_type().is_dir() {
        if opts.recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        }
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if opts.force => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring removal failure");
            Ok(())
        }
        Err(e) => Err(fs_err(format!("failed to remove {}: {e}", path.display()))),
    }
}

/// `mkdir -p`.
///
/// # Errors
///
/// Propagates the underlying I/O error.
pub fn mkdir_p(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Extensions from `PATHEXT`, lowercased, e.g. `[".exe", ".bat"]`.
#[must_use]
pub fn path_ext_extensions<E: Environment + ?Sized>(env: &E) -> Vec<String> {
    env.non_empty("PATHEXT")
        .map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

#[must_use]
pub fn is_unix_executable(mode: u32) -> bool {
    mode & 0o111 != 0
}

fn is_executable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                is_unix_executable(meta.permissions().mode())
            }
            #[cfg(not(unix))]
            {
                true
            }
        }
        _ => false,
    }
}

fn candidates<E: Environment + ?Sized>(env: &E, base: &Path) -> Vec<PathBuf> {
    let mut out = vec![base.to_path_buf()];
    if cfg!(windows) && base.extension().is_none() {
        for ext in path_ext_extensions(env) {
            let mut name = base.as_os_str().to_owned();
            name.push(&ext);
            out.push(PathBuf::from(name));
        }
    }
    out
}

/// Locate `tool` on `PATH` using the process environment.
///
/// # Errors
///
/// See [`which_in`].
pub fn which(tool: &str, check: bool) -> Result<Option<PathBuf>> {
    which_in(&ProcessEnv, tool, check)
}

/// Locate `tool` on the `PATH` of `env`.
///
/// A tool containing a path separator is checked directly. With `check`,
/// a missing tool is an error instead of `None`.
///
/// # Errors
///
/// Returns [`ToolkitError::InvalidCommand`] for an empty name and
/// [`ToolkitError::CommandNotFound`] when `check` is set and nothing matches.
pub fn which_in<E: Environment + ?Sized>(
    env: &E,
    tool: &str,
    check: bool,
) -> Result<Option<PathBuf>> {
    if tool.trim().is_empty() {
        return Err(ToolkitError::InvalidCommand {
            command: tool.to_string(),
        });
    }
    let direct = tool.contains('/') || (cfg!(windows) && tool.contains('\\'));
    let found = if direct {
        candidates(env, Path::new(tool))
            .into_iter()
            .find(|p| is_executable_file(p))
    } else {
        iter_env_path(env).into_iter().find_map(|dir| {
            candidates(env, &dir.join(tool))
                .into_iter()
                .find(|p| is_executable_file(p))
        })
    };
    match found {
        Some(p) => Ok(Some(p)),
        None if check => Err(ToolkitError::CommandNotFound {
            command: tool.to_string(),
        }),
        None => Ok(None),
    }
}

/// # Errors
///
/// Propagates the stat failure.
pub fn stat(path: &Path, follow_symlinks: bool) -> Result<FileStat> {
    FileStat::from_path(path, follow_symlinks)
}

/// Create `path` if missing and bump its modification time.
///
/// # Errors
///
/// Propagates I/O errors.
pub fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.set_modified(std::time::SystemTime::now())?;
    Ok(())
}

/// Every path under `root`, `root` included. Unreadable entries are
/// skipped; symlinks are skipped entirely unless `follow_symlinks`.
pub fn walk(root: &Path, follow_symlinks: bool) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(move |e| follow_symlinks || !e.path_is_symlink())
        .map(walkdir::DirEntry::into_path)
}

/// # Errors
///
/// Propagates I/O and UTF-8 errors.
pub fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Write or append `content`, creating parent directories.
///
/// # Errors
///
/// Propagates I/O errors.
pub fn write(path: &Path, content: &str, append: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if append {
        let mut f = OpenOptions::new().create(true).append(true).open(path)?;
        f.write_all(content.as_bytes())?;
    } else {
        fs::write(path, content)?;
    }
    Ok(())
}

/// Write through a temp file in the same directory, then rename.
///
/// # Errors
///
/// Propagates I/O errors, including a failed final rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(p) => {
            fs::create_dir_all(p)?;
            p.to_path_buf()
        }
        None => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(path.to_path_buf())
}

/// Split up to `levels` trailing extensions off `path`.
///
/// `split_ext_multi("a/archive.tar.gz", 2)` is `("a/archive", ".tar.gz")`.
/// A leading dot (`.bashrc`) is part of the name, not an extension.
#[must_use]
pub fn split_ext_multi(path: &str, levels: usize) -> (String, String) {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let name = &path[name_start..];
    let body_start = name.len() - name.trim_start_matches('.').len();
    let body = &name[body_start..];
    if levels == 0 || body.ends_with('.') {
        return (path.to_string(), String::new());
    }

    let dots: Vec<usize> = body.match_indices('.').map(|(i, _)| i).collect();
    let Some(&cut) = dots.iter().rev().take(levels).last() else {
        return (path.to_string(), String::new());
    };
    let split_at = name_start + body_start + cut;
    (path[..split_at].to_string(), path[split_at..].to_string())
}

/// `path` relative to `start` (default: the current directory), walking up
/// with `..` as needed. Falls back to the absolute path when the two share
/// no root (different Windows drives).
#[must_use]
pub fn relpath_safe(path: &Path, start: Option<&Path>) -> PathBuf {
    let target = normalize_path(path);
    let base = match start {
        Some(s) => normalize_path(s),
        None => normalize_path(Path::new(".")),
    };

    let t: Vec<Component<'_>> = target.components().collect();
    let b: Vec<Component<'_>> = base.components().collect();
    if t.first() != b.first() {
        return target;
    }
    let common = t.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let mut out = PathBuf::new();
    for _ in common..b.len() {
        out.push("..");
    }
    for c in &t[common..] {
        out.push(c.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// First of `path`, `stem<sep>1.ext`, `stem<sep>2.ext`, ... that does not
/// exist yet.
///
/// # Errors
///
/// Returns [`ToolkitError::Fs`] after `limit` attempts.
pub fn unique_path(path: &Path, sep: &str, limit: u32) -> Result<PathBuf> {
    if !exists_no_follow(path) {
        return Ok(path.to_path_buf());
    }
    let raw = path.to_string_lossy();
    let (stem, ext) = split_ext_multi(&raw, 1);
    for i in 1..=limit {
        let candidate = PathBuf::from(format!("{stem}{sep}{i}{ext}"));
        if !exists_no_follow(&candidate) {
            return Ok(candidate);
        }
    }
    Err(fs_err(format!(
        "no unique name for {} within {limit} attempts",
        path.display()
    )))
}

/// Parse `"755"` or `"rwxr-xr-x"` into mode bits.
///
/// # Errors
///
/// Returns [`ToolkitError::Fs`] for anything else.
pub fn parse_perm(perm: &str) -> Result<u32> {
    let perm = perm.trim();
    if !perm.is_empty() && perm.len() <= 4 && perm.bytes().all(|b| b.is_ascii_digit()) {
        return u32::from_str_radix(perm, 8)
            .map_err(|_| fs_err(format!("invalid octal mode: {perm}")));
    }
    if SYMBOLIC_PERM_RE.is_match(perm) {
        let mode = perm
            .bytes()
            .fold(0u32, |acc, b| (acc << 1) | u32::from(b != b'-'));
        return Ok(mode);
    }
    Err(fs_err(format!("invalid permission string: {perm}")))
}

/// `chmod` with an octal or `ls`-style permission string.
///
/// Off Unix only the owner write bit is honoured, through the read-only flag.
///
/// # Errors
///
/// Returns [`ToolkitError::Fs`] for a malformed permission string and an I/O
/// error when the mode cannot be applied.
pub fn chmod_perm(path: &Path, perm: &str) -> Result<()> {
    let mode = parse_perm(perm)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
