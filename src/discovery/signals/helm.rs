//! Helm signal: `Chart.yaml` observed during the walk; values and
//! templates are read through the VFS at generation time to infer network
//! exposure and the primary container image.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use serde_yaml::Value;
use std::sync::Arc;
use tracing::debug;

/// Known nested keys for the primary image reference, checked before the
/// recursive scan.
const IMAGE_KEY_PATTERNS: &[&[&str]] = &[
    &["image", "repository"],
    &["app", "image"],
    &["image"],
    &["deployment", "image"],
    &["webhook", "image", "repository"],
    &["cainjector", "image", "repository"],
    &["acmesolver", "image", "repository"],
    &["startupapicheck", "image", "repository"],
];

pub struct HelmSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl HelmSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }

    /// Public when any template declares an Ingress or LoadBalancer, or
    /// values enable ingress.
    fn chart_network(&self, chart_dir: &str) -> Network {
        if self.has_ingress_template(chart_dir) || self.has_ingress_in_values(chart_dir) {
            Network::Public
        } else {
            Network::Private
        }
    }

    fn has_ingress_template(&self, chart_dir: &str) -> bool {
        let templates_dir = paths::join(chart_dir, "templates");
        for entry in self.vfs.read_dir(&templates_dir) {
            let Ok(entry) = entry else { continue };
            if entry.is_dir || !is_yaml(&entry.name) {
                continue;
            }
            let template_path = paths::join(&templates_dir, &entry.name);
            let Ok(content) = self.vfs.read_to_string(&template_path) else {
                continue;
            };
            if content.contains("kind: Ingress") || content.contains("type: LoadBalancer") {
                return true;
            }
        }
        false
    }

    fn has_ingress_in_values(&self, chart_dir: &str) -> bool {
        let Some(values) = self.load_values(chart_dir) else {
            return false;
        };
        matches!(
            values.get("ingress").and_then(|i| i.get("enabled")),
            Some(Value::Bool(true))
        )
    }

    fn load_values(&self, chart_dir: &str) -> Option<Value> {
        let values_path = paths::join(chart_dir, "values.yaml");
        let content = self.vfs.read_to_string(&values_path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Primary image from values.yaml: repository+name combination, then
    /// the known key patterns, then a recursive scan for `*image*` leaves.
    fn extract_image(&self, chart_dir: &str) -> Option<String> {
        let values = self.load_values(chart_dir)?;

        if let Some(image_map) = values.get("image") {
            let repository = string_field(image_map, "repository");
            let name = string_field(image_map, "name");
            if let (Some(repository), Some(name)) = (&repository, &name) {
                let joined = if repository.ends_with('/') {
                    format!("{}{}", repository, name)
                } else {
                    format!("{}/{}", repository, name)
                };
                return Some(joined);
            }
        }

        for pattern in IMAGE_KEY_PATTERNS {
            if let Some(image) = nested_string(&values, pattern) {
                if !image.is_empty() {
                    return Some(image);
                }
            }
        }

        let mut images = Vec::new();
        collect_image_leaves(&values, &mut images);
        images.into_iter().next()
    }
}

impl ServiceSignal for HelmSignal {
    fn id(&self) -> &'static str {
        "helm"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("Chart.yaml") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, chart_dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let metadata: ChartMetadata = match serde_yaml::from_str(&content) {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed Chart.yaml");
                    continue;
                }
            };

            // Charts without any image reference are not deployable
            // services.
            let Some(image) = self.extract_image(chart_dir) else {
                debug!(path = %config_path, "chart has no image reference, skipping");
                continue;
            };

            let name = if metadata.name.is_empty() {
                ctx.dir_name(chart_dir)
            } else {
                metadata.name.clone()
            };

            services.push(Service {
                name,
                network: self.chart_network(chart_dir),
                runtime: Runtime::Continuous,
                build: Build::FromImage,
                build_path: chart_dir.clone(),
                image,
                configs: vec![ConfigRef::new("helm", config_path.clone())],
            });
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChartMetadata {
    #[serde(default)]
    name: String,
}

fn is_yaml(name: &str) -> bool {
    name.ends_with(".yaml") || name.ends_with(".yml")
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn nested_string(values: &Value, keys: &[&str]) -> Option<String> {
    let mut current = values;
    for key in &keys[..keys.len() - 1] {
        current = current.get(key)?;
    }
    match current.get(keys[keys.len() - 1]) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Depth-first scan for string leaves under keys containing `image`.
/// `imageName` matches; pull policies, tags, and versions do not.
fn collect_image_leaves(value: &Value, images: &mut Vec<String>) {
    let Value::Mapping(map) = value else { return };

    for (key, child) in map {
        let Value::String(key) = key else { continue };
        let key_lower = key.to_lowercase();

        if key_lower.contains("image") {
            if let Value::String(leaf) = child {
                let excluded = key_lower.contains("pullpolicy")
                    || key_lower.contains("tag")
                    || key_lower.contains("version");
                if !excluded && !leaf.is_empty() && !images.contains(leaf) {
                    images.push(leaf.clone());
                }
            }
        }

        collect_image_leaves(child, images);
    }
}
