//! Vercel signal: `vercel.json` marks a single web-facing deployment.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use std::sync::Arc;
use tracing::debug;

pub struct VercelSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl VercelSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for VercelSignal {
    fn id(&self) -> &'static str {
        "vercel"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("vercel.json") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            if serde_json::from_str::<serde_json::Value>(&content).is_err() {
                debug!(path = %config_path, "discarding malformed vercel.json");
                continue;
            }

            // Static site plus serverless functions, modeled as one
            // web-facing service.
            services.push(Service {
                name: ctx.dir_name(dir),
                network: Network::Public,
                runtime: Runtime::Continuous,
                build: Build::FromSource,
                build_path: dir.clone(),
                image: String::new(),
                configs: vec![ConfigRef::new("vercel", config_path.clone())],
            });
        }

        Ok(services)
    }
}
