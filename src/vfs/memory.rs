//! In-memory backend used by unit and integration tests. Mirrors the
//! archive backend's parent→children semantics without the zip machinery.

use super::{paths, DirEntry, DirStream, FileInfo, Vfs, VfsError};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct MemoryEntry {
    content: Option<Vec<u8>>,
}

impl MemoryEntry {
    fn is_dir(&self) -> bool {
        self.content.is_none()
    }
}

/// Filesystem populated from `(path, content)` pairs. Parent directories
/// are created implicitly. Paths are rooted at `"."`.
pub struct MemoryVfs {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    // Children in insertion order, keyed by parent path.
    children: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryVfs {
    pub fn new() -> Self {
        let vfs = Self {
            entries: RwLock::new(HashMap::new()),
            children: RwLock::new(HashMap::new()),
        };
        vfs.entries
            .write()
            .unwrap()
            .insert(".".to_string(), MemoryEntry { content: None });
        vfs
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.add_file_bytes(path, content.as_bytes());
    }

    pub fn add_file_bytes(&self, path: &str, content: &[u8]) {
        let path = normalize(path);
        self.ensure_parents(&path);
        self.register_child(&path);
        self.entries.write().unwrap().insert(
            path,
            MemoryEntry {
                content: Some(content.to_vec()),
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        let path = normalize(path);
        self.ensure_parents(&path);
        self.register_child(&path);
        self.entries
            .write()
            .unwrap()
            .entry(path)
            .or_insert(MemoryEntry { content: None });
    }

    fn ensure_parents(&self, path: &str) {
        let parent = paths::dir(path);
        if parent == path || parent == "." {
            return;
        }
        self.ensure_parents(parent);
        self.register_child(parent);
        self.entries
            .write()
            .unwrap()
            .entry(parent.to_string())
            .or_insert(MemoryEntry { content: None });
    }

    fn register_child(&self, path: &str) {
        let parent = paths::dir(path).to_string();
        let name = paths::base(path).to_string();
        let mut children = self.children.write().unwrap();
        let list = children.entry(parent).or_default();
        if !list.contains(&name) {
            list.push(name);
        }
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> String {
    let cleaned = paths::clean(path);
    if cleaned == "." {
        cleaned
    } else {
        format!("./{}", cleaned)
    }
}

impl Vfs for MemoryVfs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let key = normalize(path);
        let entries = self.entries.read().unwrap();
        let entry = entries
            .get(&key)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        entry
            .content
            .clone()
            .ok_or_else(|| VfsError::InvalidInput(format!("not a file: {}", path)))
    }

    fn read_dir(&self, path: &str) -> DirStream<'_> {
        let key = normalize(path);
        let entries = self.entries.read().unwrap();
        if !entries.get(&key).map(|e| e.is_dir()).unwrap_or(false) {
            let err = VfsError::NotFound(path.to_string());
            return Box::new(std::iter::once(Err(err)));
        }
        drop(entries);

        let children = self.children.read().unwrap();
        let names = children.get(&key).cloned().unwrap_or_default();
        drop(children);

        let entries = self.entries.read().unwrap();
        let items: Vec<Result<DirEntry, VfsError>> = names
            .into_iter()
            .map(|name| {
                let child_key = paths::join(&key, &name);
                let is_dir = entries
                    .get(&child_key)
                    .map(|e| e.is_dir())
                    .unwrap_or(false);
                Ok(DirEntry { name, is_dir })
            })
            .collect();

        Box::new(items.into_iter())
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        let key = normalize(path);
        let entries = self.entries.read().unwrap();
        let entry = entries
            .get(&key)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        Ok(FileInfo {
            is_dir: entry.is_dir(),
            size: entry.content.as_ref().map(|c| c.len() as u64).unwrap_or(0),
        })
    }
}
