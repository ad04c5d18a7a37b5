//! Fly.io signal: `fly.toml` app configs, one service per config.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct FlySignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl FlySignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for FlySignal {
    fn id(&self) -> &'static str {
        "fly"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("fly.toml") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let config: FlyConfig = match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed fly.toml");
                    continue;
                }
            };

            let build = config.build_kind();
            services.push(Service {
                name: ctx.dir_name(dir),
                network: config.network(),
                runtime: Runtime::Continuous,
                build,
                build_path: dir.clone(),
                image: match build {
                    Build::FromImage => config.image().unwrap_or_default(),
                    Build::FromSource => String::new(),
                },
                configs: vec![ConfigRef::new("fly", config_path.clone())],
            });
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FlyConfig {
    #[serde(default)]
    build: Option<FlyBuild>,
    #[serde(default)]
    services: Vec<toml::Value>,
    #[serde(default)]
    http_service: Option<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FlyBuild {
    #[serde(default)]
    image: Option<String>,
}

impl FlyConfig {
    /// An `http_service` block or any `[[services]]` entry means the app
    /// accepts traffic.
    fn network(&self) -> Network {
        if self.http_service.is_some() || !self.services.is_empty() {
            Network::Public
        } else {
            Network::Private
        }
    }

    fn build_kind(&self) -> Build {
        match self.image() {
            Some(image) if !image.is_empty() => Build::FromImage,
            _ => Build::FromSource,
        }
    }

    fn image(&self) -> Option<String> {
        self.build.as_ref().and_then(|b| b.image.clone())
    }
}
