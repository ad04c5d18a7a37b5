//! Environment extraction from `.env`-family files.

use super::{base_name, ContentExtractor, EnvResult};
use crate::env::classify::{classify, is_system_var};
use crate::vfs::VfsError;
use regex::Regex;
use std::sync::LazyLock;

static DOTENV_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").expect("valid regex")
});

pub struct DotenvExtractor;

impl DotenvExtractor {
    /// Production files outrank the main `.env`; example files are weak
    /// evidence of actual configuration.
    fn file_confidence(&self, filename: &str) -> u8 {
        let base = base_name(filename);
        if base == ".env" {
            85
        } else if base.contains("production") {
            90
        } else if base.contains("example") {
            30
        } else {
            75
        }
    }
}

impl ContentExtractor for DotenvExtractor {
    fn can_handle(&self, filename: &str) -> bool {
        base_name(filename).to_lowercase().starts_with(".env")
    }

    fn confidence(&self) -> u8 {
        85
    }

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError> {
        let text = std::str::from_utf8(content)
            .map_err(|_| VfsError::Malformed(filename.to_string()))?;
        let confidence = self.file_confidence(filename);

        let mut results = Vec::new();
        for caps in DOTENV_LINE.captures_iter(text) {
            let name = caps[1].to_string();
            if is_system_var(&name) {
                continue;
            }
            let value = clean_value(&caps[2]);
            let (env_type, sensitive) = classify(&name, &value);
            results.push(EnvResult {
                var_name: name,
                value,
                env_type,
                sensitive,
                source: format!("dotenv:{}", filename),
                confidence,
            });
        }

        Ok(results)
    }
}

/// Strips quotes and trailing comments from a dotenv value.
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
        {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    // Unquoted values lose inline comments.
    match trimmed.split_once(" #") {
        Some((value, _)) => value.trim().to_string(),
        None => trimmed.to_string(),
    }
}
