pub mod cli;
pub mod config;
pub mod discovery;
pub mod env;
pub mod output;
pub mod util;
pub mod vfs;

pub use config::{ConfigError, TurnoutConfig};
pub use discovery::{
    discover, discover_services, Build, CancelToken, ConfigRef, DiscoverContext, DiscoveryError,
    Network, Runtime, Service, ServiceDiscovery, ServiceSignal,
};
pub use env::{dedupe_by_name, extract_service_env, EnvExtractor, EnvResult, EnvType};
pub use output::{DiscoveryReport, EnvReport};
pub use vfs::{
    resolve_source, DirEntry, FileInfo, GitVfs, GithubVfs, LocalVfs, MemoryVfs, ResolvedSource,
    Vfs, VfsError, WalkControl,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_turnout() {
        assert_eq!(NAME, "turnout");
    }
}
