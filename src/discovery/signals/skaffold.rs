//! Skaffold signal: `skaffold.yaml` build artifacts, one service each.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub struct SkaffoldSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl SkaffoldSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for SkaffoldSignal {
    fn id(&self) -> &'static str {
        "skaffold"
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
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("skaffold.yaml") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, config_dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;
            let config: SkaffoldConfig = match serde_yaml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    debug!(path = %config_path, error = %e, "discarding malformed skaffold.yaml");
                    continue;
                }
            };

            let artifacts = &config.build.artifacts;
            if artifacts.is_empty() {
                // No artifacts: model the config as one source-built
                // service at the config directory.
                services.push(Service {
                    name: ctx.dir_name(config_dir),
                    network: Network::Private,
                    runtime: Runtime::Continuous,
                    build: Build::FromSource,
                    build_path: config_dir.clone(),
                    image: String::new(),
                    configs: vec![ConfigRef::new("skaffold", config_path.clone())],
                });
                continue;
            }

            for artifact in artifacts {
                let build = artifact.build_kind();
                services.push(Service {
                    name: artifact.service_name(ctx, config_dir),
                    // Kubernetes exposure is unknowable without rendering
                    // manifests.
                    network: Network::Private,
                    runtime: Runtime::Continuous,
                    build,
                    build_path: artifact.build_path(config_dir),
                    image: match build {
                        Build::FromImage => artifact.image.clone(),
                        Build::FromSource => String::new(),
                    },
                    configs: vec![ConfigRef::new("skaffold", config_path.clone())],
                });
            }
        }

        Ok(services)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SkaffoldConfig {
    #[serde(default)]
    build: SkaffoldBuild,
}

#[derive(Debug, Default, Deserialize)]
struct SkaffoldBuild {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Default, Deserialize)]
struct Artifact {
    #[serde(default)]
    image: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    docker: Option<DockerArtifact>,
    #[serde(default)]
    jib: Option<serde_yaml::Value>,
    #[serde(default)]
    bazel: Option<serde_yaml::Value>,
    #[serde(default)]
    ko: Option<serde_yaml::Value>,
    #[serde(default)]
    custom: Option<serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerArtifact {
    #[serde(default)]
    dockerfile: Option<String>,
}

impl Artifact {
    /// Any declared builder means the artifact builds from source; a bare
    /// image name is a pre-built reference.
    fn build_kind(&self) -> Build {
        if self.docker.is_some()
            || self.jib.is_some()
            || self.bazel.is_some()
            || self.ko.is_some()
            || self.custom.is_some()
        {
            Build::FromSource
        } else {
            Build::FromImage
        }
    }

    /// Service name from the last image path segment
    /// (`gcr.io/project/myapp` → `myapp`).
    fn service_name(&self, ctx: &DiscoverContext, config_dir: &str) -> String {
        match self.image.rsplit('/').next() {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => ctx.dir_name(config_dir),
        }
    }

    /// The artifact context is the build directory; a dockerfile location
    /// is the fallback, the config directory the last resort.
    fn build_path(&self, config_dir: &str) -> String {
        if let Some(context) = &self.context {
            return resolve_relative(context, config_dir);
        }
        if let Some(dockerfile) = self.docker.as_ref().and_then(|d| d.dockerfile.as_deref()) {
            return resolve_relative(paths::dir(dockerfile), config_dir);
        }
        config_dir.to_string()
    }
}

fn resolve_relative(path: &str, config_dir: &str) -> String {
    if path == "." {
        return config_dir.to_string();
    }
    if let Some(stripped) = path.strip_prefix("./") {
        return paths::join(config_dir, stripped);
    }
    if path.starts_with('/') {
        return path.to_string();
    }
    paths::join(config_dir, path)
}
