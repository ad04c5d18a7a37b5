//! Heroku `app.json` signal: the app itself plus its addons mapped to
//! canonical images.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct HerokuAppJsonSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl HerokuAppJsonSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for HerokuAppJsonSignal {
    fn id(&self) -> &'static str {
        "heroku-app-json"
    }

    fn confidence(&self) -> u8 {
        90
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("app.json") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let config: AppJson = match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed app.json");
                    continue;
                }
            };

            let name = if config.name.is_empty() {
                ctx.dir_name(dir)
            } else {
                config.name.clone()
            };

            services.push(Service {
                name,
                network: Network::Public,
                runtime: Runtime::Continuous,
                build: Build::FromSource,
                build_path: dir.clone(),
                image: String::new(),
                configs: vec![ConfigRef::new("heroku-app-json", config_path.clone())],
            });

            for addon in &config.addons {
                let plan = addon.plan();
                let Some(image) = addon_image(plan) else {
                    continue;
                };
                services.push(Service {
                    name: plan.to_string(),
                    network: Network::Private,
                    runtime: Runtime::Continuous,
                    build: Build::FromImage,
                    build_path: String::new(),
                    image: image.to_string(),
                    configs: vec![ConfigRef::new("heroku-app-json", config_path.clone())],
                });
            }
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    addons: Vec<Addon>,
}

/// Addons appear as a bare plan string or an object with a `plan` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Addon {
    Plan(String),
    Detailed {
        #[serde(default)]
        plan: String,
    },
}

impl Addon {
    fn plan(&self) -> &str {
        match self {
            Addon::Plan(plan) => plan,
            Addon::Detailed { plan } => plan,
        }
    }
}

/// Maps addon plans like `heroku-postgresql:hobby-dev` to canonical images.
fn addon_image(plan: &str) -> Option<&'static str> {
    const ADDON_IMAGES: &[(&str, &str)] = &[
        ("heroku-postgresql", "postgres"),
        ("postgresql", "postgres"),
        ("postgres", "postgres"),
        ("heroku-redis", "redis"),
        ("rediscloud", "redis"),
        ("redis", "redis"),
        ("memcachier", "memcached"),
        ("memcached", "memcached"),
        ("mongolab", "mongo"),
        ("mongohq", "mongo"),
        ("mongodb", "mongo"),
    ];

    ADDON_IMAGES
        .iter()
        .find(|(addon, _)| plan == *addon || plan.starts_with(&format!("{}:", addon)))
        .map(|(_, image)| *image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    fn run_signal(vfs: Arc<MemoryVfs>) -> Vec<Service> {
        let ctx = DiscoverContext::new(".", "repo");
        let mut signal = HerokuAppJsonSignal::new(vfs.clone());
        signal.reset();
        for entry in vfs.read_dir(".") {
            signal.observe_entry(&ctx, ".", &entry.unwrap()).unwrap();
        }
        signal.generate_services(&ctx).unwrap()
    }

    #[test]
    fn test_app_with_addons() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "app.json",
            r#"{
  "name": "shop",
  "addons": ["heroku-postgresql:hobby-dev", {"plan": "heroku-redis"}]
}"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 3);

        assert_eq!(services[0].name, "shop");
        assert_eq!(services[0].network, Network::Public);
        assert_eq!(services[0].build_path, ".");

        let pg = services
            .iter()
            .find(|s| s.name == "heroku-postgresql:hobby-dev")
            .unwrap();
        assert_eq!(pg.image, "postgres");
        assert_eq!(pg.build, Build::FromImage);
        assert_eq!(pg.build_path, "");

        let redis = services.iter().find(|s| s.name == "heroku-redis").unwrap();
        assert_eq!(redis.image, "redis");
    }

    #[test]
    fn test_unnamed_app_uses_dir_name() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file("app.json", r#"{"stack": "heroku-22"}"#);

        let services = run_signal(vfs);
        assert_eq!(services[0].name, "repo");
    }

    #[test]
    fn test_unknown_addon_skipped() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "app.json",
            r#"{"name": "app", "addons": ["scheduler:standard"]}"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_addon_image_mapping() {
        assert_eq!(addon_image("heroku-postgresql"), Some("postgres"));
        assert_eq!(addon_image("heroku-postgresql:standard-0"), Some("postgres"));
        assert_eq!(addon_image("memcachier:dev"), Some("memcached"));
        assert_eq!(addon_image("papertrail"), None);
    }
}
