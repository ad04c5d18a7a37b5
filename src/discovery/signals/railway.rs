//! Railway signal: `railway.json` / `railway.toml` config-as-code.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct RailwaySignal {
    vfs: Arc<dyn Vfs>,
    // Config path -> containing directory, in walk order.
    found: Vec<(String, String)>,
}

impl RailwaySignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }

    fn parse_config(&self, path: &str) -> Result<RailwayConfig, VfsError> {
        let content = self.vfs.read_to_string(path)?;
        let parsed = if path.ends_with(".json") {
            serde_json::from_str(&content).map_err(|_| VfsError::Malformed(path.to_string()))?
        } else {
            toml::from_str(&content).map_err(|_| VfsError::Malformed(path.to_string()))?
        };
        Ok(parsed)
    }
}

impl ServiceSignal for RailwaySignal {
    fn id(&self) -> &'static str {
        "railway"
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
        if !entry.is_dir
            && (entry.name.eq_ignore_ascii_case("railway.json")
                || entry.name.eq_ignore_ascii_case("railway.toml"))
        {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let config = match self.parse_config(config_path) {
                Ok(config) => config,
                Err(VfsError::Malformed(path)) => {
                    debug!(%path, "discarding malformed railway config");
                    continue;
                }
                Err(e) => return Err(e),
            };

            services.push(Service {
                name: ctx.dir_name(dir),
                network: config.network(),
                runtime: Runtime::Continuous,
                build: Build::FromSource,
                build_path: dir.clone(),
                image: String::new(),
                configs: vec![ConfigRef::new("railway", config_path.clone())],
            });
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RailwayConfig {
    #[serde(default)]
    deploy: Option<RailwayDeploy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RailwayDeploy {
    #[serde(default)]
    start_command: Option<String>,
    #[serde(default)]
    healthcheck_path: Option<String>,
}

impl RailwayConfig {
    /// A health check or start command marks a web-facing deploy.
    fn network(&self) -> Network {
        match &self.deploy {
            Some(deploy)
                if deploy.healthcheck_path.as_deref().is_some_and(|s| !s.is_empty())
                    || deploy.start_command.as_deref().is_some_and(|s| !s.is_empty()) =>
            {
                Network::Public
            }
            _ => Network::Private,
        }
    }
}
