//! Environment extraction from Docker Compose service blocks.

use super::{ContentExtractor, EnvResult};
use crate::env::classify::{classify, is_system_var};
use crate::vfs::VfsError;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

pub struct ComposeEnvExtractor;

impl ContentExtractor for ComposeEnvExtractor {
    fn can_handle(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        lower.contains("compose") && (lower.ends_with(".yml") || lower.ends_with(".yaml"))
    }

    fn confidence(&self) -> u8 {
        80
    }

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError> {
        let text = std::str::from_utf8(content)
            .map_err(|_| VfsError::Malformed(filename.to_string()))?;
        let compose: ComposeFile = serde_yaml::from_str(text)
            .map_err(|_| VfsError::Malformed(filename.to_string()))?;

        let mut results = Vec::new();
        for service in compose.services.values() {
            for (name, value) in service.environment_pairs() {
                if is_system_var(&name) {
                    continue;
                }
                let (env_type, sensitive) = classify(&name, &value);
                results.push(EnvResult {
                    var_name: name,
                    value,
                    env_type,
                    sensitive,
                    source: format!("docker-compose:{}", filename),
                    confidence: self.confidence(),
                });
            }
        }

        Ok(results)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposeService {
    #[serde(default)]
    environment: Option<EnvironmentSpec>,
}

/// Compose accepts both map and `KEY=value` list syntax.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvironmentSpec {
    Map(BTreeMap<String, Option<Value>>),
    List(Vec<String>),
}

impl ComposeService {
    fn environment_pairs(&self) -> Vec<(String, String)> {
        match &self.environment {
            None => Vec::new(),
            Some(EnvironmentSpec::Map(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), scalar_string(v.as_ref())))
                .collect(),
            Some(EnvironmentSpec::List(items)) => items
                .iter()
                .map(|item| match item.split_once('=') {
                    Some((k, v)) => (k.to_string(), v.to_string()),
                    None => (item.clone(), String::new()),
                })
                .collect(),
        }
    }
}

fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
