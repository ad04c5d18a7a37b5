//! Regex scanner for declared configuration schemas: Go `env:` struct
//! tags, Zod/Joi/envalid schemas, Pydantic fields, Spring `@Value`.

use super::{ContentExtractor, EnvResult};
use crate::env::classify::{classify, is_system_var};
use crate::vfs::VfsError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const CONFIG_EXTENSIONS: &[&str] = &[".go", ".ts", ".js", ".py", ".java", ".kt"];

/// Each pattern captures the variable name; the second capture, when
/// present, is a declared default value.
static STRUCTURED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Go struct tags with a default
        r#"env:"([A-Z_][A-Z0-9_]*)".*envDefault:"([^"]*)""#,
        // Go struct tags
        r#"env:"([A-Z_][A-Z0-9_]*)""#,
        // Zod schema fields: VAR_NAME: z.string()
        r"([A-Z_][A-Z0-9_]*)\s*:\s*z\.",
        // Joi object schema
        r"Joi\.object\([^}]*?([A-Z_][A-Z0-9_]*)\s*:\s*Joi\.\w+",
        // envalid cleanEnv
        r"cleanEnv\([^}]*?([A-Z_][A-Z0-9_]*)\s*:\s*\w+\(",
        // Pydantic Field
        r#"Field\(env="([A-Z_][A-Z0-9_]*)""#,
        // Spring @Value annotation
        r#"@Value\("\$\{([A-Z_][A-Z0-9_]*)\}"\)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

pub struct StructuredConfigExtractor;

impl ContentExtractor for StructuredConfigExtractor {
    fn can_handle(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        CONFIG_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Intentional configuration declarations.
    fn confidence(&self) -> u8 {
        85
    }

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError> {
        let Ok(text) = std::str::from_utf8(content) else {
            return Ok(Vec::new());
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        for pattern in STRUCTURED_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let name = caps[1].to_string();
                if is_system_var(&name) || !seen.insert(name.clone()) {
                    continue;
                }

                let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                let (env_type, sensitive) = classify(&name, default_value);
                results.push(EnvResult {
                    var_name: name,
                    value: default_value.to_string(),
                    env_type,
                    sensitive,
                    source: format!("config:{}", filename),
                    confidence: self.confidence(),
                });
            }
        }

        Ok(results)
    }
}
