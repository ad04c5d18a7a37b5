//! Netlify signal: `netlify.toml` marks a single static-site deployment.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use std::sync::Arc;
use tracing::debug;

pub struct NetlifySignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl NetlifySignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for NetlifySignal {
    fn id(&self) -> &'static str {
        "netlify"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("netlify.toml") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            if toml::from_str::<toml::Value>(&content).is_err() {
                debug!(path = %config_path, "discarding malformed netlify.toml");
                continue;
            }

            services.push(Service {
                name: ctx.dir_name(dir),
                network: Network::Public,
                runtime: Runtime::Continuous,
                build: Build::FromSource,
                build_path: dir.clone(),
                image: String::new(),
                configs: vec![ConfigRef::new("netlify", config_path.clone())],
            });
        }

        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    #[test]
    fn test_netlify_config() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "netlify.toml",
            "[build]\ncommand = \"npm run build\"\npublish = \"dist\"\n",
        );

        let ctx = DiscoverContext::new(".", "mysite");
        let mut signal = NetlifySignal::new(vfs.clone());
        signal.reset();
        for entry in vfs.read_dir(".") {
            signal.observe_entry(&ctx, ".", &entry.unwrap()).unwrap();
        }

        let services = signal.generate_services(&ctx).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "mysite");
        assert_eq!(services[0].network, Network::Public);
        assert_eq!(services[0].configs[0].config_type, "netlify");
    }
}
