//! Dockerfile signal: buildable evidence, not deployment intent on its own.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, VfsError};

/// Matches `Dockerfile`, `Dockerfile.*`, and `*.Dockerfile` regardless of
/// case.
pub fn is_dockerfile(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "dockerfile" || lower.starts_with("dockerfile.") || lower.ends_with(".dockerfile")
}

pub struct DockerfileSignal {
    // Dockerfile path -> containing directory, in walk order.
    found: Vec<(String, String)>,
}

impl DockerfileSignal {
    pub fn new() -> Self {
        Self { found: Vec::new() }
    }
}

impl Default for DockerfileSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceSignal for DockerfileSignal {
    fn id(&self) -> &'static str {
        "dockerfile"
    }

    fn confidence(&self) -> u8 {
        70
    }

    fn reset(&mut self) {
        self.found.clear();
    }

    fn observe_entry(
        &mut self,
        _ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError> {
        if !entry.is_dir && is_dockerfile(&entry.name) {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let services = self
            .found
            .iter()
            .map(|(path, dir)| Service {
                name: ctx.dir_name(dir),
                network: Network::Private,
                runtime: Runtime::Continuous,
                build: Build::FromSource,
                build_path: dir.clone(),
                image: String::new(),
                configs: vec![ConfigRef::new("dockerfile", path.clone())],
            })
            .collect();
        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_variants() {
        assert!(is_dockerfile("Dockerfile"));
        assert!(is_dockerfile("dockerfile"));
        assert!(is_dockerfile("Dockerfile.prod"));
        assert!(is_dockerfile("api.Dockerfile"));
        assert!(!is_dockerfile("Dockerfile-old.txt"));
        assert!(!is_dockerfile("dockerfiles"));
    }

    #[test]
    fn test_one_service_per_dockerfile() {
        let ctx = DiscoverContext::new(".", "myrepo");
        let mut signal = DockerfileSignal::new();
        signal.reset();

        signal
            .observe_entry(&ctx, ".", &DirEntry::file("Dockerfile"))
            .unwrap();
        signal
            .observe_entry(&ctx, "./api", &DirEntry::file("Dockerfile.prod"))
            .unwrap();

        let services = signal.generate_services(&ctx).unwrap();
        assert_eq!(services.len(), 2);

        assert_eq!(services[0].name, "myrepo");
        assert_eq!(services[0].build_path, ".");
        assert_eq!(services[0].configs[0].path, "./Dockerfile");

        assert_eq!(services[1].name, "api");
        assert_eq!(services[1].build_path, "./api");
        assert_eq!(services[1].network, Network::Private);
    }

    #[test]
    fn test_reset_clears_state() {
        let ctx = DiscoverContext::new(".", "myrepo");
        let mut signal = DockerfileSignal::new();
        signal
            .observe_entry(&ctx, ".", &DirEntry::file("Dockerfile"))
            .unwrap();
        signal.reset();

        assert!(signal.generate_services(&ctx).unwrap().is_empty());
    }
}
