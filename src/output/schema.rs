//! Stable JSON export types consumed by downstream migration tooling.

use crate::discovery::Service;
use crate::env::EnvResult;
use serde::{Deserialize, Serialize};

/// The discover command's output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub services: Vec<Service>,
}

impl DiscoveryReport {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The env command's output document: variables grouped per service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvReport {
    pub services: Vec<ServiceEnv>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEnv {
    pub name: String,
    pub variables: Vec<EnvResult>,
}

impl EnvReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
