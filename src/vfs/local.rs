//! Local-directory backend: a thin wrapper over OS directory reads.

use super::{DirEntry, DirStream, FileInfo, Vfs, VfsError};
use std::fs;
use std::path::Path;

/// Direct passthrough to the host filesystem. Directory streams wrap the
/// OS iterator, so giant directories are never materialized up front.
#[derive(Debug, Default)]
pub struct LocalVfs;

impl LocalVfs {
    pub fn new() -> Self {
        Self
    }
}

impl Vfs for LocalVfs {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        fs::read(path).map_err(|e| VfsError::from_io(&e, path))
    }

    fn read_dir(&self, path: &str) -> DirStream<'_> {
        let owned = path.to_string();
        match fs::read_dir(path) {
            Ok(iter) => Box::new(iter.map(move |res| match res {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let is_dir = entry
                        .file_type()
                        .map(|t| t.is_dir())
                        .unwrap_or_else(|_| Path::new(&owned).join(&name).is_dir());
                    Ok(DirEntry { name, is_dir })
                }
                Err(e) => Err(VfsError::from_io(&e, &owned)),
            })),
            Err(e) => {
                let err = VfsError::from_io(&e, path);
                Box::new(std::iter::once(Err(err)))
            }
        }
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        let meta = fs::metadata(path).map_err(|e| VfsError::from_io(&e, path))?;
        Ok(FileInfo {
            is_dir: meta.is_dir(),
            size: meta.len(),
        })
    }
}
