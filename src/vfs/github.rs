//! GitHub archive backend: fetches a single zipball of the repository at a
//! ref and serves reads out of the zip's central directory plus a
//! lightweight parent→children index.
//!
//! The index stores child name strings only, never zip entry handles, so
//! walking a large repository does not pin archive metadata in memory.

use super::{paths, DirEntry, DirStream, FileInfo, Vfs, VfsError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use zip::ZipArchive;

const DEFAULT_REF: &str = "main";

/// Repository archive mounted as a read-only filesystem. The zipball is
/// downloaded on first access behind a once-barrier; `cleanup` drops the
/// zip reader and its temp file.
pub struct GithubVfs {
    owner: String,
    repo: String,
    ref_name: String,
    base_path: String,
    token: Option<String>,
    timeout: Duration,
    state: Mutex<Option<Result<ArchiveState, VfsError>>>,
}

struct ArchiveState {
    archive: Mutex<ZipArchive<File>>,
    // Parent path -> direct child names. Presence of a key means directory.
    index: HashMap<String, Vec<String>>,
    prefix: String,
    _temp: Option<tempfile::NamedTempFile>,
}

impl GithubVfs {
    pub fn new(owner: &str, repo: &str, ref_name: &str, token: Option<String>) -> Self {
        Self::with_base_path(owner, repo, ref_name, "", token)
    }

    /// `base_path` is a subdirectory within the archive treated as the VFS
    /// root, e.g. `services/api` for `github://acme/monorepo/tree/main/services/api`.
    pub fn with_base_path(
        owner: &str,
        repo: &str,
        ref_name: &str,
        base_path: &str,
        token: Option<String>,
    ) -> Self {
        let ref_name = if ref_name.is_empty() {
            DEFAULT_REF
        } else {
            ref_name
        };
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            ref_name: ref_name.to_string(),
            base_path: paths::clean(base_path.trim_matches('/')),
            token,
            timeout: Duration::from_secs(30),
            state: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL used in error messages: always the anonymous form, never the
    /// authenticated variant, so tokens cannot leak through errors.
    fn display_url(&self) -> String {
        format!(
            "https://codeload.github.com/{}/{}/zip/{}",
            self.owner, self.repo, self.ref_name
        )
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&ArchiveState) -> Result<T, VfsError>,
    ) -> Result<T, VfsError> {
        let mut guard = self.state.lock().unwrap();
        if guard.is_none() {
            *guard = Some(self.download_and_index());
        }
        match guard.as_ref().unwrap() {
            Ok(state) => f(state),
            Err(e) => Err(e.clone()),
        }
    }

    fn download_and_index(&self) -> Result<ArchiveState, VfsError> {
        let temp = tempfile::NamedTempFile::new().map_err(|e| VfsError::Io {
            path: "archive temp file".to_string(),
            message: e.to_string(),
        })?;

        self.download_zipball(temp.path())?;

        let file = File::open(temp.path()).map_err(|e| VfsError::Io {
            path: self.display_url(),
            message: e.to_string(),
        })?;
        let archive =
            ZipArchive::new(file).map_err(|_| VfsError::Malformed(self.display_url()))?;

        let (index, prefix) = build_path_index(&archive);
        debug!(
            owner = %self.owner,
            repo = %self.repo,
            dirs = index.len(),
            "indexed repository archive"
        );

        Ok(ArchiveState {
            archive: Mutex::new(archive),
            index,
            prefix,
            _temp: Some(temp),
        })
    }

    fn download_zipball(&self, dest: &std::path::Path) -> Result<(), VfsError> {
        let display = self.display_url();

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| VfsError::Network(format!("{}: {}", display, e)))?;

        // Authenticated fetches go through the API endpoint; anonymous ones
        // through codeload.
        let request = match &self.token {
            Some(token) => client
                .get(format!(
                    "https://api.github.com/repos/{}/{}/zipball/{}",
                    self.owner, self.repo, self.ref_name
                ))
                .bearer_auth(token)
                .header("User-Agent", "turnout"),
            None => client.get(&display).header("User-Agent", "turnout"),
        };

        let response = request
            .send()
            .map_err(|e| VfsError::Network(format!("{}: {}", display, redact(&e.to_string()))))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => VfsError::AuthFailed(format!("HTTP 401 for {}", display)),
                403 => VfsError::Denied(format!("HTTP 403 for {}", display)),
                404 => VfsError::NotFound(display),
                429 => VfsError::RateLimited(format!("HTTP 429 for {}", display)),
                code => VfsError::Network(format!("HTTP {} for {}", code, display)),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| VfsError::Network(format!("{}: {}", display, redact(&e.to_string()))))?;
        std::fs::write(dest, &bytes).map_err(|e| VfsError::Io {
            path: display,
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn validate_path(&self, path: &str) -> Result<(), VfsError> {
        if path.starts_with('/') {
            return Err(VfsError::InvalidInput(format!(
                "absolute path not allowed: {}",
                path
            )));
        }
        if paths::has_parent_ref(path) {
            return Err(VfsError::InvalidInput(format!(
                "path traversal detected: {}",
                path
            )));
        }
        Ok(())
    }

    /// Maps a VFS path to a clean archive-relative path, applying the base
    /// path. The result uses `""` for the archive root (index key form).
    fn resolve_path(&self, path: &str) -> String {
        let cleaned = paths::clean(path);
        let cleaned = if cleaned == "." { "" } else { cleaned.as_str() };

        if self.base_path == "." {
            return cleaned.to_string();
        }
        if cleaned.is_empty() {
            return self.base_path.clone();
        }
        format!("{}/{}", self.base_path, cleaned)
    }

    /// Mounts an already-downloaded zipball, skipping the network fetch.
    /// Useful for tests and offline archives.
    pub fn from_zip(file: File, base_path: &str) -> Result<Self, VfsError> {
        let archive = ZipArchive::new(file)
            .map_err(|_| VfsError::Malformed("zip archive".to_string()))?;
        let (index, prefix) = build_path_index(&archive);
        let state = ArchiveState {
            archive: Mutex::new(archive),
            index,
            prefix,
            _temp: None,
        };
        Ok(Self {
            owner: String::new(),
            repo: String::new(),
            ref_name: DEFAULT_REF.to_string(),
            base_path: paths::clean(base_path.trim_matches('/')),
            token: None,
            timeout: Duration::from_secs(30),
            state: Mutex::new(Some(Ok(state))),
        })
    }
}

/// Strips `token=`-style query fragments that an HTTP client error could
/// carry. Defense against echoing the authenticated URL.
fn redact(message: &str) -> String {
    match message.find("api.github.com") {
        Some(_) => "request to api.github.com failed".to_string(),
        None => message.to_string(),
    }
}

fn build_path_index<R: Read + std::io::Seek>(
    archive: &ZipArchive<R>,
) -> (HashMap<String, Vec<String>>, String) {
    let mut prefix = String::new();
    for name in archive.file_names() {
        let trimmed = name.trim_matches('/');
        if let Some(first) = trimmed.split('/').next() {
            if !first.is_empty() {
                prefix = format!("{}/", first);
                break;
            }
        }
    }

    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    index.insert(String::new(), Vec::new());

    for name in archive.file_names() {
        let clean = name.strip_prefix(&prefix).unwrap_or(name).trim_matches('/');
        if clean.is_empty() {
            continue;
        }

        // Register the entry and every implicit ancestor directory.
        let mut parent = String::new();
        let parts: Vec<&str> = clean.split('/').collect();
        for (i, part) in parts.iter().enumerate() {
            let children = index.entry(parent.clone()).or_default();
            if !children.iter().any(|c| c == part) {
                children.push(part.to_string());
            }

            let child_path = if parent.is_empty() {
                part.to_string()
            } else {
                format!("{}/{}", parent, part)
            };

            let is_last = i == parts.len() - 1;
            let entry_is_dir = !is_last || name.ends_with('/');
            if entry_is_dir {
                index.entry(child_path.clone()).or_default();
            }
            parent = child_path;
        }
    }

    (index, prefix)
}

impl Vfs for GithubVfs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        self.validate_path(path)?;
        let resolved = self.resolve_path(path);
        let original = path.to_string();

        self.with_state(|state| {
            let target = format!("{}{}", state.prefix, resolved);
            let mut archive = state.archive.lock().unwrap();
            let mut entry = archive
                .by_name(&target)
                .map_err(|_| VfsError::NotFound(original.clone()))?;
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf).map_err(|e| VfsError::Io {
                path: original.clone(),
                message: e.to_string(),
            })?;
            Ok(buf)
        })
    }

    fn read_dir(&self, path: &str) -> DirStream<'_> {
        if let Err(e) = self.validate_path(path) {
            return Box::new(std::iter::once(Err(e)));
        }
        let resolved = self.resolve_path(path);
        let original = path.to_string();

        let listing = self.with_state(|state| {
            let children = state
                .index
                .get(&resolved)
                .ok_or_else(|| VfsError::NotFound(original.clone()))?;

            // Synthesize lightweight entries up front; the stream must not
            // borrow archive state.
            let items: Vec<Result<DirEntry, VfsError>> = children
                .iter()
                .map(|name| {
                    let child_path = if resolved.is_empty() {
                        name.clone()
                    } else {
                        format!("{}/{}", resolved, name)
                    };
                    Ok(DirEntry {
                        name: name.clone(),
                        is_dir: state.index.contains_key(&child_path),
                    })
                })
                .collect();
            Ok(items)
        });

        match listing {
            Ok(items) => Box::new(items.into_iter()),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        self.validate_path(path)?;
        let resolved = self.resolve_path(path);
        let original = path.to_string();

        self.with_state(|state| {
            if state.index.contains_key(&resolved) {
                return Ok(FileInfo {
                    is_dir: true,
                    size: 0,
                });
            }
            let target = format!("{}{}", state.prefix, resolved);
            let mut archive = state.archive.lock().unwrap();
            let entry = archive
                .by_name(&target)
                .map_err(|_| VfsError::NotFound(original.clone()))?;
            Ok(FileInfo {
                is_dir: false,
                size: entry.size(),
            })
        })
    }

    fn cleanup(&self) -> Result<(), VfsError> {
        let mut guard = self.state.lock().unwrap();
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_test_archive() -> File {
        let mut temp = tempfile::tempfile().unwrap();
        {
            let mut writer = zip::ZipWriter::new(&mut temp);
            let opts = SimpleFileOptions::default();
            writer.add_directory("acme-monorepo-main/", opts).unwrap();
            writer
                .start_file("acme-monorepo-main/README.md", opts)
                .unwrap();
            writer.write_all(b"# monorepo").unwrap();
            writer
                .start_file("acme-monorepo-main/services/api/fly.toml", opts)
                .unwrap();
            writer.write_all(b"app = \"api\"").unwrap();
            writer
                .start_file("acme-monorepo-main/services/api/main.go", opts)
                .unwrap();
            writer.write_all(b"package main").unwrap();
            writer.finish().unwrap();
        }
        temp
    }

    #[test]
    fn test_read_dir_root() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "").unwrap();

        let names: Vec<String> = vfs
            .read_dir(".")
            .filter_map(|e| e.ok())
            .map(|e| e.name)
            .collect();
        assert!(names.contains(&"README.md".to_string()));
        assert!(names.contains(&"services".to_string()));
    }

    #[test]
    fn test_implicit_directories_indexed() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "").unwrap();

        let entries: Vec<DirEntry> = vfs.read_dir("services").filter_map(|e| e.ok()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "api");
        assert!(entries[0].is_dir);
    }

    #[test]
    fn test_read_file() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "").unwrap();
        let content = vfs.read_to_string("services/api/fly.toml").unwrap();
        assert_eq!(content, "app = \"api\"");
    }

    #[test]
    fn test_base_path_roots_the_subtree() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "services/api").unwrap();

        let names: Vec<String> = vfs
            .read_dir(".")
            .filter_map(|e| e.ok())
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["fly.toml", "main.go"]);

        let content = vfs.read_to_string("./fly.toml").unwrap();
        assert_eq!(content, "app = \"api\"");
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "services/api").unwrap();
        let err = vfs.read_file("../README.md").unwrap_err();
        assert!(matches!(err, VfsError::InvalidInput(_)));

        let err = vfs.read_file("/etc/passwd").unwrap_err();
        assert!(matches!(err, VfsError::InvalidInput(_)));
    }

    #[test]
    fn test_stat() {
        let vfs = GithubVfs::from_zip(build_test_archive(), "").unwrap();

        let info = vfs.stat("services/api").unwrap();
        assert!(info.is_dir);

        let info = vfs.stat("services/api/main.go").unwrap();
        assert!(!info.is_dir);
        assert_eq!(info.size, 12);
    }

    #[test]
    fn test_display_url_has_no_token() {
        let vfs = GithubVfs::new("acme", "repo", "main", Some("sekrit".to_string()));
        assert!(!vfs.display_url().contains("sekrit"));
        assert_eq!(
            vfs.display_url(),
            "https://codeload.github.com/acme/repo/zip/main"
        );
    }
}
