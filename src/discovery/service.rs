//! The discovery data model: services and their config provenance.

use serde::{Deserialize, Serialize};

/// Connectivity class of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// No network access needed.
    None,
    /// Service-to-service only.
    Private,
    /// Internet-facing.
    Public,
}

/// Long-running service vs. batch/cron job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Continuous,
    Scheduled,
}

/// How the service would be realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Build {
    FromSource,
    FromImage,
}

/// Provenance record: which platform config, at which path, contributed
/// evidence for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRef {
    #[serde(rename = "type")]
    pub config_type: String,
    pub path: String,
}

impl ConfigRef {
    pub fn new(config_type: &str, path: impl Into<String>) -> Self {
        Self {
            config_type: config_type.to_string(),
            path: path.into(),
        }
    }
}

/// A deployable unit discovered in the source tree.
///
/// Invariants: `build == FromImage` implies a non-empty `image`;
/// `build == FromSource` implies a non-empty `build_path`; `configs` is
/// never empty and is unique by `(type, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub network: Network,
    pub runtime: Runtime,
    pub build: Build,
    pub build_path: String,
    pub image: String,
    pub configs: Vec<ConfigRef>,
}

impl Service {
    /// Appends a config ref unless an equal `(type, path)` pair is already
    /// recorded.
    pub fn add_config(&mut self, config: ConfigRef) {
        let exists = self
            .configs
            .iter()
            .any(|c| c.config_type == config.config_type && c.path == config.path);
        if !exists {
            self.configs.push(config);
        }
    }
}
