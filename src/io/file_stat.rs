//! Metadata snapshot for a filesystem entry.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;

/// What kind of entry a [`FileStat`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Size, kind, permissions and timestamps of one path.
#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    pub path: PathBuf,
    pub kind: FileKind,
    pub size: u64,
    /// Permission bits (`st_mode & 0o7777`). Synthesised from the
    /// read-only flag on platforms without Unix modes.
    pub mode: u32,
    pub readonly: bool,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
}

fn to_utc(t: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    t.ok().map(DateTime::<Utc>::from)
}

impl FileStat {
    /// Stat `path`, following symlinks unless `follow_symlinks` is false.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the path cannot be stat'ed.
    pub fn from_path(path: &Path, follow_symlinks: bool) -> Result<Self> {
        let meta = if follow_symlinks {
            std::fs::metadata(path)?
        } else {
            std::fs::symlink_metadata(path)?
        };
        Ok(Self::from_metadata(path, &meta))
    }

    #[must_use]
    pub fn from_metadata(path: &Path, meta: &Metadata) -> Self {
        let ft = meta.file_type();
        let kind = if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_dir() {
            FileKind::Dir
        } else if ft.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };
        let readonly = meta.permissions().readonly();

        #[cfg(unix)]
        let (mode, uid, gid) = {
            use std::os::unix::fs::MetadataExt;
            (meta.mode() & 0o7777, Some(meta.uid()), Some(meta.gid()))
        };
        #[cfg(not(unix))]
        let (mode, uid, gid) = (if readonly { 0o444 } else { 0o666 }, None, None);

        Self {
            path: path.to_path_buf(),
            kind,
            size: meta.len(),
            mode,
            readonly,
            modified: to_utc(meta.modified()),
            accessed: to_utc(meta.accessed()),
            created: to_utc(meta.created()),
            uid,
            gid,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Any execute bit set on a regular file.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.is_file() && super::is_unix_executable(self.mode)
    }

    /// `ls -l` style permission string, e.g. `-rwxr-xr-x`.
    #[must_use]
    pub fn permissions_string(&self) -> String {
        let kind = match self.kind {
            FileKind::Dir => 'd',
            FileKind::Symlink => 'l',
            FileKind::File | FileKind::Other => '-',
        };
        let mut s = String::with_capacity(10);
        s.push(kind);
        for shift in [6u32, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        s
    }
}
