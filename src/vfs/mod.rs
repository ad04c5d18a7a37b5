//! Virtual filesystem abstraction spanning local directories, shallow git
//! clones, and in-memory GitHub archives.
//!
//! Every backend exposes the same read-only surface: `read_file`, a lazy
//! `read_dir` stream, `stat`, and a recursive `walk` with a skip sentinel.
//! Paths use forward-slash semantics regardless of backend (see [`paths`]).

mod git;
mod github;
mod local;
mod locator;
mod memory;
pub mod paths;

pub use git::GitVfs;
pub use github::GithubVfs;
pub use local::LocalVfs;
pub use locator::{resolve_source, ResolvedSource};
pub use memory::MemoryVfs;

use thiserror::Error;

/// Structured error taxonomy for VFS operations.
///
/// `NotFound` is expected and absorbed locally by callers; `Denied`,
/// `RateLimited`, `AuthFailed`, and `Network` are critical and tracked by
/// the discovery orchestrator.
#[derive(Debug, Clone, Error)]
pub enum VfsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Denied(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed content in {0}")]
    Malformed(String),

    #[error("operation canceled")]
    Canceled,

    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
}

impl VfsError {
    /// Critical errors are remembered by the orchestrator and surfaced when
    /// discovery would otherwise return nothing.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            VfsError::Denied(_)
                | VfsError::RateLimited(_)
                | VfsError::AuthFailed(_)
                | VfsError::Network(_)
        )
    }

    pub(crate) fn from_io(err: &std::io::Error, path: &str) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => VfsError::NotFound(path.to_string()),
            ErrorKind::PermissionDenied => VfsError::Denied(path.to_string()),
            _ => VfsError::Io {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// A single entry yielded by a directory stream. Deliberately lightweight:
/// name and kind only, no backing handle, so large archive walks do not pin
/// archive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub is_dir: bool,
    pub size: u64,
}

/// Visitor verdict for [`Vfs::walk`]. `SkipDir` prunes the current subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    SkipDir,
}

/// Lazy, finite, non-restartable directory stream. The consumer may abandon
/// iteration mid-stream; backends release resources on drop.
pub type DirStream<'a> = Box<dyn Iterator<Item = Result<DirEntry, VfsError>> + 'a>;

const DEFAULT_WALK_DEPTH: usize = 10;

/// Read-only filesystem surface shared by all backends.
pub trait Vfs: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    fn read_dir(&self, path: &str) -> DirStream<'_>;

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError>;

    /// Releases owned resources (archive handle, clone directory). Safe to
    /// call once; backends without resources default to a no-op.
    fn cleanup(&self) -> Result<(), VfsError> {
        Ok(())
    }

    fn read_to_string(&self, path: &str) -> Result<String, VfsError> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::Malformed(path.to_string()))
    }

    /// Recursive walk rooted at `root`. The visitor sees every readable
    /// entry; returning [`WalkControl::SkipDir`] for a directory prunes its
    /// subtree. Unreadable entries are skipped.
    fn walk(
        &self,
        root: &str,
        visit: &mut dyn FnMut(&str, &FileInfo) -> WalkControl,
    ) -> Result<(), VfsError> {
        walk_via_read_dir(self, root, visit, 0)
    }
}

fn walk_via_read_dir<V: Vfs + ?Sized>(
    vfs: &V,
    dir: &str,
    visit: &mut dyn FnMut(&str, &FileInfo) -> WalkControl,
    depth: usize,
) -> Result<(), VfsError> {
    if depth > DEFAULT_WALK_DEPTH {
        return Ok(());
    }

    let entries: Vec<DirEntry> = vfs.read_dir(dir).filter_map(|e| e.ok()).collect();
    for entry in entries {
        let path = paths::join(dir, &entry.name);
        let info = FileInfo {
            is_dir: entry.is_dir,
            size: 0,
        };
        let verdict = visit(&path, &info);
        if entry.is_dir && verdict != WalkControl::SkipDir {
            walk_via_read_dir(vfs, &path, visit, depth + 1)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_classification() {
        assert!(VfsError::Denied("x".into()).is_critical());
        assert!(VfsError::RateLimited("x".into()).is_critical());
        assert!(VfsError::AuthFailed("x".into()).is_critical());
        assert!(VfsError::Network("x".into()).is_critical());
        assert!(!VfsError::NotFound("x".into()).is_critical());
        assert!(!VfsError::Malformed("x".into()).is_critical());
        assert!(!VfsError::InvalidInput("x".into()).is_critical());
        assert!(!VfsError::Canceled.is_critical());
    }

    #[test]
    fn test_io_error_mapping() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            VfsError::from_io(&err, "a/b"),
            VfsError::NotFound(_)
        ));

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(VfsError::from_io(&err, "a/b"), VfsError::Denied(_)));
    }

    #[test]
    fn test_walk_skips_pruned_subtree() {
        let vfs = MemoryVfs::new();
        vfs.add_file("app/main.py", "print('hi')");
        vfs.add_file("app/skip/inner.txt", "x");
        vfs.add_file("top.txt", "y");

        let mut seen = Vec::new();
        vfs.walk(".", &mut |path, info| {
            seen.push(path.to_string());
            if info.is_dir && path.ends_with("/skip") {
                WalkControl::SkipDir
            } else {
                WalkControl::Continue
            }
        })
        .unwrap();

        assert!(seen.iter().any(|p| p.ends_with("main.py")));
        assert!(seen.iter().any(|p| p.ends_with("top.txt")));
        assert!(seen.iter().any(|p| p.ends_with("/skip")));
        assert!(!seen.iter().any(|p| p.ends_with("inner.txt")));
    }
}
