//! Serverless Framework signal: `serverless.{yml,yaml,json}` function
//! definitions with HTTP and schedule event triggers.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

fn is_serverless_config(name: &str) -> bool {
    ["serverless.yml", "serverless.yaml", "serverless.json"]
        .iter()
        .any(|f| name.eq_ignore_ascii_case(f))
}

pub struct ServerlessSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl ServerlessSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for ServerlessSignal {
    fn id(&self) -> &'static str {
        "serverless"
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
        if !entry.is_dir && is_serverless_config(&entry.name) {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let parsed: Result<ServerlessConfig, String> = if config_path.ends_with(".json") {
                serde_json::from_str(&content).map_err(|e| e.to_string())
            } else {
                serde_yaml::from_str(&content).map_err(|e| e.to_string())
            };
            let config = match parsed {
                Ok(config) => config,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed serverless config");
                    continue;
                }
            };

            let name = if config.service.is_empty() {
                ctx.dir_name(dir)
            } else {
                config.service.clone()
            };

            let image = config.function_image();
            let build = if image.is_some() {
                Build::FromImage
            } else {
                Build::FromSource
            };

            services.push(Service {
                name,
                network: config.network(),
                runtime: config.runtime(),
                build,
                build_path: dir.clone(),
                image: image.unwrap_or_default(),
                configs: vec![ConfigRef::new("serverless", config_path.clone())],
            });
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServerlessConfig {
    #[serde(default)]
    service: String,
    #[serde(default)]
    functions: BTreeMap<String, Value>,
}

impl ServerlessConfig {
    /// Walks each function's event list once, looking for a specific
    /// trigger key.
    fn any_function_event(&self, keys: &[&str]) -> bool {
        for function in self.functions.values() {
            let Some(Value::Sequence(events)) = function.get("events") else {
                continue;
            };
            for event in events {
                if keys.iter().any(|k| event.get(k).is_some()) {
                    return true;
                }
            }
        }
        false
    }

    /// HTTP-triggered functions are public API endpoints.
    fn network(&self) -> Network {
        if self.any_function_event(&["http", "httpApi"]) {
            Network::Public
        } else {
            Network::Private
        }
    }

    fn runtime(&self) -> Runtime {
        if self.any_function_event(&["schedule"]) {
            Runtime::Scheduled
        } else {
            Runtime::Continuous
        }
    }

    fn function_image(&self) -> Option<String> {
        for function in self.functions.values() {
            if let Some(Value::String(image)) = function.get("image") {
                if !image.is_empty() {
                    return Some(image.clone());
                }
            }
        }
        None
    }
}
