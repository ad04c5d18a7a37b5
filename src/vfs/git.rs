//! Git clone backend: shallow-clones the requested ref into a temp
//! directory on first access, then delegates to the local backend.

use super::{paths, DirStream, FileInfo, LocalVfs, Vfs, VfsError};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Lazily-cloned repository. The clone directory is owned by this instance;
/// `cleanup` deletes it and must be invoked by the caller (dropping the
/// instance also removes it).
pub struct GitVfs {
    repo_url: String,
    ref_name: String,
    local: LocalVfs,
    state: Mutex<CloneState>,
}

struct CloneState {
    dir: Option<tempfile::TempDir>,
    result: Option<Result<PathBuf, VfsError>>,
}

impl GitVfs {
    pub fn new(repo_url: &str, ref_name: &str) -> Result<Self, VfsError> {
        let dir = tempfile::TempDir::new().map_err(|e| VfsError::Io {
            path: "git temp dir".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            repo_url: repo_url.to_string(),
            ref_name: if ref_name.is_empty() {
                "main".to_string()
            } else {
                ref_name.to_string()
            },
            local: LocalVfs::new(),
            state: Mutex::new(CloneState {
                dir: Some(dir),
                result: None,
            }),
        })
    }

    fn clone_root(&self) -> Result<PathBuf, VfsError> {
        let mut state = self.state.lock().unwrap();
        if let Some(result) = &state.result {
            return result.clone();
        }

        let root = match &state.dir {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                return Err(VfsError::Io {
                    path: self.repo_url.clone(),
                    message: "clone directory already cleaned up".to_string(),
                })
            }
        };

        let result = self.run_clone(&root).map(|_| root);
        state.result = Some(result.clone());
        result
    }

    fn run_clone(&self, dest: &std::path::Path) -> Result<(), VfsError> {
        debug!(repo = %self.repo_url, r#ref = %self.ref_name, "cloning repository");

        // Shallow branch-specific clone first; fall back to the default
        // branch plus a best-effort checkout of the requested ref.
        let branch_clone = Command::new("git")
            .args(["clone", "--depth", "1", "--branch", &self.ref_name])
            .arg(&self.repo_url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| VfsError::Network(format!("git clone failed: {}", e)))?;

        if branch_clone.status.success() {
            return Ok(());
        }

        let default_clone = Command::new("git")
            .args(["clone", "--depth", "1"])
            .arg(&self.repo_url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| VfsError::Network(format!("git clone failed: {}", e)))?;

        if !default_clone.status.success() {
            let stderr = String::from_utf8_lossy(&default_clone.stderr);
            return Err(classify_clone_failure(&self.repo_url, &stderr));
        }

        let checkout = Command::new("git")
            .args(["checkout", &self.ref_name])
            .current_dir(dest)
            .output();
        if let Ok(out) = checkout {
            if !out.status.success() {
                warn!(r#ref = %self.ref_name, "checkout failed, staying on default branch");
            }
        }

        Ok(())
    }

    fn full_path(&self, name: &str) -> Result<String, VfsError> {
        let root = self.clone_root()?;
        let cleaned = paths::clean(name);
        let root_str = root.to_string_lossy();
        if cleaned == "." {
            Ok(root_str.into_owned())
        } else {
            Ok(paths::join(&root_str, &cleaned))
        }
    }
}

fn classify_clone_failure(url: &str, stderr: &str) -> VfsError {
    let lower = stderr.to_lowercase();
    if lower.contains("authentication") || lower.contains("could not read username") {
        VfsError::AuthFailed(format!("git clone of {}", url))
    } else if lower.contains("not found") || lower.contains("repository") && lower.contains("exist")
    {
        VfsError::NotFound(url.to_string())
    } else {
        VfsError::Network(format!("git clone of {} failed: {}", url, stderr.trim()))
    }
}

impl Vfs for GitVfs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let full = self.full_path(path)?;
        self.local.read_file(&full)
    }

    fn read_dir(&self, path: &str) -> DirStream<'_> {
        match self.full_path(path) {
            Ok(full) => self.local.read_dir(&full),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        let full = self.full_path(path)?;
        self.local.stat(&full)
    }

    fn cleanup(&self) -> Result<(), VfsError> {
        let mut state = self.state.lock().unwrap();
        if let Some(dir) = state.dir.take() {
            dir.close().map_err(|e| VfsError::Io {
                path: self.repo_url.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_clone_failure() {
        assert!(matches!(
            classify_clone_failure("u", "fatal: Authentication failed"),
            VfsError::AuthFailed(_)
        ));
        assert!(matches!(
            classify_clone_failure("u", "fatal: repository 'u' not found"),
            VfsError::NotFound(_)
        ));
        assert!(matches!(
            classify_clone_failure("u", "fatal: unable to access"),
            VfsError::Network(_)
        ));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let vfs = GitVfs::new("https://example.invalid/repo.git", "main").unwrap();
        vfs.cleanup().unwrap();
        vfs.cleanup().unwrap();

        // After cleanup, access fails rather than recloning into nowhere.
        assert!(vfs.read_file("README.md").is_err());
    }
}
