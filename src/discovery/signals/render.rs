//! Render signal: `render.yaml` blueprints declaring multiple services,
//! static sites, and databases.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct RenderSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl RenderSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for RenderSignal {
    fn id(&self) -> &'static str {
        "render"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("render.yaml") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, _ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let config: RenderBlueprint = match serde_yaml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed render.yaml");
                    continue;
                }
            };

            for declared in &config.services {
                let build = declared.build_kind();
                services.push(Service {
                    name: declared.name.clone(),
                    network: declared.network(),
                    runtime: declared.runtime(),
                    build,
                    build_path: dir.clone(),
                    image: declared.image_url().unwrap_or_default(),
                    configs: vec![ConfigRef::new("render", config_path.clone())],
                });
            }

            for db in &config.databases {
                services.push(Service {
                    name: db.name.clone(),
                    network: Network::Private,
                    runtime: Runtime::Continuous,
                    build: Build::FromImage,
                    build_path: String::new(),
                    image: engine_image(db.engine.as_deref().unwrap_or("postgres")),
                    configs: vec![ConfigRef::new("render", config_path.clone())],
                });
            }
        }

        Ok(services)
    }
}

/// Canonical image for a managed-database engine name.
pub(crate) fn engine_image(engine: &str) -> String {
    match engine.to_uppercase().as_str() {
        "PG" | "POSTGRES" | "POSTGRESQL" => "postgres".to_string(),
        "MYSQL" => "mysql".to_string(),
        "REDIS" => "redis".to_string(),
        "MONGODB" | "MONGO" => "mongo".to_string(),
        _ => engine.to_lowercase(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RenderBlueprint {
    #[serde(default)]
    services: Vec<RenderService>,
    #[serde(default)]
    databases: Vec<RenderDatabase>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderService {
    #[serde(default)]
    name: String,
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    schedule: Option<String>,
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    health_check_path: Option<String>,
    #[serde(default)]
    image: Option<RenderImage>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderImage {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RenderDatabase {
    #[serde(default)]
    name: String,
    #[serde(default)]
    engine: Option<String>,
}

impl RenderService {
    fn network(&self) -> Network {
        // Web services are public; private services and workers are not.
        if self.r#type == "web" {
            return Network::Public;
        }
        Network::Private
    }

    fn runtime(&self) -> Runtime {
        if self.r#type == "cron" || self.schedule.as_deref().is_some_and(|s| !s.is_empty()) {
            Runtime::Scheduled
        } else {
            Runtime::Continuous
        }
    }

    fn build_kind(&self) -> Build {
        match self.image_url() {
            Some(url) if !url.is_empty() => Build::FromImage,
            _ => Build::FromSource,
        }
    }

    fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|i| i.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    fn run_signal(vfs: Arc<MemoryVfs>) -> Vec<Service> {
        let ctx = DiscoverContext::new(".", "repo");
        let mut signal = RenderSignal::new(vfs.clone());
        signal.reset();
        for entry in vfs.read_dir(".") {
            signal.observe_entry(&ctx, ".", &entry.unwrap()).unwrap();
        }
        signal.generate_services(&ctx).unwrap()
    }

    #[test]
    fn test_blueprint_with_all_kinds() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "render.yaml",
            r#"
services:
  - type: web
    name: frontend
    domains:
      - example.com
  - type: worker
    name: jobs
  - type: cron
    name: nightly
    schedule: "0 3 * * *"
databases:
  - name: maindb
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 4);

        let frontend = services.iter().find(|s| s.name == "frontend").unwrap();
        assert_eq!(frontend.network, Network::Public);
        assert_eq!(frontend.runtime, Runtime::Continuous);
        assert_eq!(frontend.build_path, ".");

        let jobs = services.iter().find(|s| s.name == "jobs").unwrap();
        assert_eq!(jobs.network, Network::Private);

        let nightly = services.iter().find(|s| s.name == "nightly").unwrap();
        assert_eq!(nightly.runtime, Runtime::Scheduled);

        let db = services.iter().find(|s| s.name == "maindb").unwrap();
        assert_eq!(db.build, Build::FromImage);
        assert_eq!(db.image, "postgres");
        assert_eq!(db.build_path, "");
    }

    #[test]
    fn test_prebuilt_image_service() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "render.yaml",
            r#"
services:
  - type: pserv
    name: cache
    image:
      url: docker.io/library/redis:7
"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].build, Build::FromImage);
        assert_eq!(services[0].image, "docker.io/library/redis:7");
    }

    #[test]
    fn test_engine_image_mapping() {
        assert_eq!(engine_image("PG"), "postgres");
        assert_eq!(engine_image("mysql"), "mysql");
        assert_eq!(engine_image("REDIS"), "redis");
        assert_eq!(engine_image("mongo"), "mongo");
        assert_eq!(engine_image("clickhouse"), "clickhouse");
    }
}
