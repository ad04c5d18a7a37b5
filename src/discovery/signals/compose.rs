//! Docker Compose signal: one service per compose service block.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Compose filenames matched case-insensitively, production variants
/// included.
const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
    "docker-compose.prod.yml",
    "docker-compose.prod.yaml",
    "docker-compose.production.yml",
    "docker-compose.production.yaml",
    "compose.prod.yml",
    "compose.prod.yaml",
    "compose.production.yml",
    "compose.production.yaml",
];

pub fn is_compose_file(name: &str) -> bool {
    COMPOSE_FILES.iter().any(|f| name.eq_ignore_ascii_case(f))
}

/// High confidence, but compose files are often local-dev only, which
/// keeps this at the bottom of the explicit band.
pub struct DockerComposeSignal {
    vfs: Arc<dyn Vfs>,
    // All compose files in walk order; the first one wins.
    config_paths: Vec<String>,
    config_dirs: BTreeMap<String, String>,
}

impl DockerComposeSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            config_paths: Vec::new(),
            config_dirs: BTreeMap::new(),
        }
    }
}

impl ServiceSignal for DockerComposeSignal {
    fn id(&self) -> &'static str {
        "docker-compose"
    }

    fn confidence(&self) -> u8 {
        80
    }

    fn reset(&mut self) {
        self.config_paths.clear();
        self.config_dirs.clear();
    }

    fn observe_entry(
        &mut self,
        _ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError> {
        if !entry.is_dir && is_compose_file(&entry.name) {
            let config_path = paths::join(parent_path, &entry.name);
            self.config_dirs
                .insert(config_path.clone(), parent_path.to_string());
            self.config_paths.push(config_path);
        }
        Ok(())
    }

    fn generate_services(&mut self, _ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        // Only the first compose file observed during the walk is loaded.
        let Some(config_path) = self.config_paths.first() else {
            return Ok(Vec::new());
        };
        let working_dir = &self.config_dirs[config_path];

        let content = self.vfs.read_to_string(config_path)?;
        let compose: ComposeFile = match serde_yaml::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(path = %config_path, error = %e, "discarding malformed compose file");
                return Ok(Vec::new());
            }
        };

        let mut services = Vec::new();
        for (name, compose_service) in &compose.services {
            let build = compose_service.build_kind();
            let mut service = Service {
                name: name.clone(),
                network: compose_service.network(),
                runtime: Runtime::Continuous,
                build,
                build_path: String::new(),
                image: String::new(),
                configs: vec![ConfigRef::new("docker-compose", config_path.clone())],
            };

            match build {
                Build::FromSource => {
                    // Build context is relative to the compose file's
                    // directory.
                    let context = compose_service.build_context().unwrap_or(".");
                    service.build_path = if context == "." {
                        working_dir.clone()
                    } else {
                        paths::join(working_dir, context.trim_start_matches("./"))
                    };
                }
                Build::FromImage => {
                    service.image = compose_service.image.clone().unwrap_or_default();
                }
            }

            services.push(service);
        }

        Ok(services)
    }
}

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Deserialize)]
struct ComposeService {
    #[serde(default)]
    build: Option<BuildSpec>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    ports: Vec<PortSpec>,
    #[serde(default)]
    expose: Vec<serde_yaml::Value>,
}

impl ComposeService {
    fn build_kind(&self) -> Build {
        if self.build.is_some() {
            Build::FromSource
        } else {
            Build::FromImage
        }
    }

    fn build_context(&self) -> Option<&str> {
        match &self.build {
            Some(BuildSpec::Context(ctx)) => Some(ctx.as_str()),
            Some(BuildSpec::Detailed { context }) => context.as_deref(),
            None => None,
        }
    }

    /// No ports or expose at all means a background worker; published
    /// standard web ports mean internet-facing; everything else is an
    /// internal service.
    fn network(&self) -> Network {
        if self.ports.is_empty() && self.expose.is_empty() {
            return Network::None;
        }
        if self
            .ports
            .iter()
            .filter_map(|p| p.published_port())
            .any(|port| port == 80 || port == 443)
        {
            return Network::Public;
        }
        Network::Private
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BuildSpec {
    Context(String),
    Detailed {
        #[serde(default)]
        context: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortSpec {
    Number(u32),
    Short(String),
    Long {
        #[serde(default)]
        published: Option<serde_yaml::Value>,
    },
}

impl PortSpec {
    /// The host-side port, if one is declared. Short syntax may carry a
    /// host address (`0.0.0.0:80:80`); the published port is the
    /// second-to-last segment.
    fn published_port(&self) -> Option<u32> {
        match self {
            PortSpec::Number(_) => None,
            PortSpec::Short(spec) => {
                let parts: Vec<&str> = spec.split(':').collect();
                if parts.len() < 2 {
                    return None;
                }
                parts[parts.len() - 2].parse().ok()
            }
            PortSpec::Long { published } => match published {
                Some(serde_yaml::Value::Number(n)) => n.as_u64().map(|n| n as u32),
                Some(serde_yaml::Value::String(s)) => s.parse().ok(),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    fn run_signal(vfs: Arc<MemoryVfs>) -> Vec<Service> {
        let ctx = DiscoverContext::new(".", "repo");
        let mut signal = DockerComposeSignal::new(vfs.clone());
        signal.reset();

        for entry in vfs.read_dir(".") {
            let entry = entry.unwrap();
            signal.observe_entry(&ctx, ".", &entry).unwrap();
        }
        signal.generate_services(&ctx).unwrap()
    }

    #[test]
    fn test_flask_redis_compose() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "docker-compose.yml",
            r#"
services:
  web:
    build: ./web
    ports:
      - "5000:5000"
  redis:
    image: redis:7
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 2);

        let redis = services.iter().find(|s| s.name == "redis").unwrap();
        assert_eq!(redis.build, Build::FromImage);
        assert_eq!(redis.image, "redis:7");
        assert_eq!(redis.build_path, "");
        assert_eq!(redis.network, Network::None);

        let web = services.iter().find(|s| s.name == "web").unwrap();
        assert_eq!(web.build, Build::FromSource);
        assert_eq!(web.build_path, "./web");
        assert_eq!(web.network, Network::Private);
        assert_eq!(web.configs[0].path, "./docker-compose.yml");
    }

    #[test]
    fn test_published_web_port_is_public() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "compose.yaml",
            r#"
services:
  proxy:
    image: nginx:alpine
    ports:
      - "80:80"
  bound:
    image: nginx:alpine
    ports:
      - "0.0.0.0:443:8443"
"#,
        );

        let services = run_signal(vfs);
        assert!(services.iter().all(|s| s.network == Network::Public));
    }

    #[test]
    fn test_expose_only_is_private() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "docker-compose.yml",
            r#"
services:
  cache:
    image: memcached
    expose:
      - "11211"
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].network, Network::Private);
    }

    #[test]
    fn test_long_port_syntax() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "docker-compose.yml",
            r#"
services:
  edge:
    image: traefik
    ports:
      - target: 8080
        published: 443
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].network, Network::Public);
    }

    #[test]
    fn test_detailed_build_context() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "docker-compose.yml",
            r#"
services:
  api:
    build:
      context: ./backend
      dockerfile: Dockerfile.prod
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].build_path, "./backend");
    }

    #[test]
    fn test_first_compose_file_wins() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "docker-compose.yml",
            "services:\n  first:\n    image: a\n",
        );
        vfs.add_file(
            "compose.prod.yml",
            "services:\n  second:\n    image: b\n",
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "first");
    }

    #[test]
    fn test_malformed_compose_discarded() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file("docker-compose.yml", "services: [not: valid: yaml");

        let services = run_signal(vfs);
        assert!(services.is_empty());
    }

    #[test]
    fn test_matches_filename_variants() {
        assert!(is_compose_file("docker-compose.yml"));
        assert!(is_compose_file("Compose.YAML"));
        assert!(is_compose_file("compose.production.yaml"));
        assert!(!is_compose_file("docker-compose.override.yml"));
        assert!(!is_compose_file("compose.json"));
    }
}
