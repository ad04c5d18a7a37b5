//! Content extractors: each knows one file format and produces typed
//! environment variables from raw content.

mod compose;
mod dockerfile;
mod dotenv;
mod library_calls;
mod structured_config;

pub use compose::ComposeEnvExtractor;
pub use dockerfile::DockerfileEnvExtractor;
pub use dotenv::DotenvExtractor;
pub use library_calls::LibraryCallExtractor;
pub use structured_config::StructuredConfigExtractor;

use super::types::EnvResult;
use crate::vfs::VfsError;

/// Processes file content and extracts environment variables.
pub trait ContentExtractor: Send + Sync {
    /// True when this extractor understands the given filename.
    fn can_handle(&self, filename: &str) -> bool;

    /// Base confidence for results from this extractor (0-100).
    fn confidence(&self) -> u8;

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError>;
}

/// Last path component, for extractors that match on basenames.
pub(crate) fn base_name(filename: &str) -> &str {
    crate::vfs::paths::base(filename)
}
