//! Typed environment-variable extraction results.

use serde::{Deserialize, Serialize};

/// Classification of an environment variable by name and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvType {
    Unknown,
    Secret,
    Database,
    Config,
    /// Value looks machine-generated (UUID, nanoid, JWT, random string).
    Generated,
    Url,
    Boolean,
    Numeric,
}

/// One extracted variable. `(var_name, source)` identifies a result;
/// deduplication by name keeps the highest-confidence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvResult {
    pub var_name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub env_type: EnvType,
    pub sensitive: bool,
    /// `kind:path`, e.g. `dotenv:./.env.production`.
    pub source: String,
    pub confidence: u8,
}

/// Keeps the highest-confidence result per variable name, preserving
/// first-seen order. This is the caller-side half of the extraction
/// contract.
pub fn dedupe_by_name(results: impl IntoIterator<Item = EnvResult>) -> Vec<EnvResult> {
    let mut order: Vec<String> = Vec::new();
    let mut best: std::collections::HashMap<String, EnvResult> = std::collections::HashMap::new();

    for result in results {
        match best.get(&result.var_name) {
            None => {
                order.push(result.var_name.clone());
                best.insert(result.var_name.clone(), result);
            }
            Some(existing) if result.confidence > existing.confidence => {
                best.insert(result.var_name.clone(), result);
            }
            Some(_) => {}
        }
    }

    order.into_iter().filter_map(|name| best.remove(&name)).collect()
}
