//! DigitalOcean App Platform signal: `.do/app.yaml` and root-level app
//! specs declaring services, static sites, workers, jobs, and databases.

use super::render::engine_image;
use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct DigitalOceanAppSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl DigitalOceanAppSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for DigitalOceanAppSignal {
    fn id(&self) -> &'static str {
        "digitalocean-app"
    }

    fn confidence(&self) -> u8 {
        95
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
        if entry.is_dir && entry.name == ".do" {
            // The build path stays the directory containing .do.
            let spec_path = paths::join(&paths::join(parent_path, ".do"), "app.yaml");
            match self.vfs.stat(&spec_path) {
                Ok(info) if !info.is_dir => {
                    self.found.push((spec_path, parent_path.to_string()));
                }
                Ok(_) => {}
                Err(VfsError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        } else if !entry.is_dir
            && (entry.name.eq_ignore_ascii_case("app.yaml")
                || entry.name.eq_ignore_ascii_case("digitalocean-app.yaml"))
        {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, _ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, build_path) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let spec: AppSpec = match serde_yaml::from_str(&content) {
                Ok(spec) => spec,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed app spec");
                    continue;
                }
            };

            let config = ConfigRef::new("digitalocean-app", config_path.clone());

            for component in &spec.services {
                services.push(Service {
                    name: component.name.clone(),
                    network: Network::Public,
                    runtime: Runtime::Continuous,
                    build: component.build_kind(),
                    build_path: build_path.clone(),
                    image: component.image_registry().unwrap_or_default(),
                    configs: vec![config.clone()],
                });
            }

            for site in &spec.static_sites {
                services.push(Service {
                    name: site.name.clone(),
                    network: Network::Public,
                    runtime: Runtime::Continuous,
                    build: Build::FromSource,
                    build_path: build_path.clone(),
                    image: String::new(),
                    configs: vec![config.clone()],
                });
            }

            for worker in &spec.workers {
                services.push(Service {
                    name: worker.name.clone(),
                    network: Network::None,
                    runtime: Runtime::Continuous,
                    build: worker.build_kind(),
                    build_path: build_path.clone(),
                    image: worker.image_registry().unwrap_or_default(),
                    configs: vec![config.clone()],
                });
            }

            for job in &spec.jobs {
                services.push(Service {
                    name: job.name.clone(),
                    network: Network::None,
                    runtime: Runtime::Scheduled,
                    build: job.build_kind(),
                    build_path: build_path.clone(),
                    image: job.image_registry().unwrap_or_default(),
                    configs: vec![config.clone()],
                });
            }

            for db in &spec.databases {
                services.push(Service {
                    name: db.name.clone(),
                    network: Network::Private,
                    runtime: Runtime::Continuous,
                    build: Build::FromImage,
                    build_path: String::new(),
                    image: engine_image(&db.engine),
                    configs: vec![config.clone()],
                });
            }
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppSpec {
    #[serde(default)]
    services: Vec<AppComponent>,
    #[serde(default)]
    static_sites: Vec<AppComponent>,
    #[serde(default)]
    workers: Vec<AppComponent>,
    #[serde(default)]
    jobs: Vec<AppComponent>,
    #[serde(default)]
    databases: Vec<AppDatabase>,
}

#[derive(Debug, Default, Deserialize)]
struct AppComponent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<AppImage>,
}

#[derive(Debug, Default, Deserialize)]
struct AppImage {
    #[serde(default)]
    registry: String,
}

#[derive(Debug, Default, Deserialize)]
struct AppDatabase {
    #[serde(default)]
    name: String,
    #[serde(default)]
    engine: String,
}

impl AppComponent {
    fn build_kind(&self) -> Build {
        match self.image_registry() {
            Some(registry) if !registry.is_empty() => Build::FromImage,
            _ => Build::FromSource,
        }
    }

    fn image_registry(&self) -> Option<String> {
        self.image.as_ref().map(|i| i.registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    fn run_signal(vfs: Arc<MemoryVfs>) -> Vec<Service> {
        let ctx = DiscoverContext::new(".", "repo");
        let mut signal = DigitalOceanAppSignal::new(vfs.clone());
        signal.reset();
        for entry in vfs.read_dir(".") {
            signal.observe_entry(&ctx, ".", &entry.unwrap()).unwrap();
        }
        signal.generate_services(&ctx).unwrap()
    }

    const SPEC: &str = r#"
name: sample
services:
  - name: api
    http_port: 8080
workers:
  - name: queue-worker
jobs:
  - name: migrate
    kind: PRE_DEPLOY
databases:
  - name: db
    engine: PG
static_sites:
  - name: docs
"#;

    #[test]
    fn test_dot_do_app_yaml() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(".do/app.yaml", SPEC);

        let services = run_signal(vfs);
        assert_eq!(services.len(), 5);

        let api = services.iter().find(|s| s.name == "api").unwrap();
        assert_eq!(api.network, Network::Public);
        // Built from the repo root, not from inside .do.
        assert_eq!(api.build_path, ".");
        assert_eq!(api.configs[0].path, "./.do/app.yaml");

        let worker = services.iter().find(|s| s.name == "queue-worker").unwrap();
        assert_eq!(worker.network, Network::None);

        let job = services.iter().find(|s| s.name == "migrate").unwrap();
        assert_eq!(job.runtime, Runtime::Scheduled);

        let db = services.iter().find(|s| s.name == "db").unwrap();
        assert_eq!(db.image, "postgres");
        assert_eq!(db.build, Build::FromImage);

        let docs = services.iter().find(|s| s.name == "docs").unwrap();
        assert_eq!(docs.network, Network::Public);
    }

    #[test]
    fn test_root_level_app_yaml() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file("digitalocean-app.yaml", SPEC);

        let services = run_signal(vfs);
        assert_eq!(services.len(), 5);
        assert_eq!(
            services[0].configs[0].path,
            "./digitalocean-app.yaml"
        );
    }

    #[test]
    fn test_prebuilt_image_component() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "app.yaml",
            r#"
services:
  - name: cache
    image:
      registry: registry.digitalocean.com/acme/cache
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].build, Build::FromImage);
        assert_eq!(services[0].image, "registry.digitalocean.com/acme/cache");
    }
}
