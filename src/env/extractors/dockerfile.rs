//! Environment extraction from Dockerfile `ENV` instructions.

use super::{ContentExtractor, EnvResult};
use crate::env::classify::{classify, is_system_var};
use crate::vfs::VfsError;

pub struct DockerfileEnvExtractor;

impl ContentExtractor for DockerfileEnvExtractor {
    fn can_handle(&self, filename: &str) -> bool {
        filename.to_lowercase().contains("dockerfile")
    }

    fn confidence(&self) -> u8 {
        60
    }

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError> {
        let text = std::str::from_utf8(content)
            .map_err(|_| VfsError::Malformed(filename.to_string()))?;

        let mut results = Vec::new();
        for instruction in logical_lines(text) {
            let Some(args) = instruction.strip_prefix_ignore_case("ENV") else {
                continue;
            };

            for (name, value) in parse_env_args(args) {
                if is_system_var(&name) {
                    continue;
                }
                let (env_type, sensitive) = classify(&name, &value);
                results.push(EnvResult {
                    var_name: name,
                    value,
                    env_type,
                    sensitive,
                    source: format!("dockerfile:{}", filename),
                    confidence: self.confidence(),
                });
            }
        }

        Ok(results)
    }
}

trait StripPrefixIgnoreCase {
    /// Strips a leading instruction keyword followed by whitespace.
    fn strip_prefix_ignore_case(&self, prefix: &str) -> Option<&str>;
}

impl StripPrefixIgnoreCase for str {
    fn strip_prefix_ignore_case(&self, prefix: &str) -> Option<&str> {
        if self.len() <= prefix.len() {
            return None;
        }
        let (head, tail) = self.split_at(prefix.len());
        if head.eq_ignore_ascii_case(prefix) && tail.starts_with(char::is_whitespace) {
            Some(tail.trim_start())
        } else {
            None
        }
    }
}

/// Joins `\`-continued lines into logical instructions and drops comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.starts_with('#') {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            current.push_str(continued.trim_end());
            current.push(' ');
            continue;
        }

        current.push_str(line);
        if !current.trim().is_empty() {
            lines.push(current.trim().to_string());
        }
        current = String::new();
    }

    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }
    lines
}

/// Both `ENV K=V [K2=V2 ...]` and the legacy `ENV K V` forms.
fn parse_env_args(args: &str) -> Vec<(String, String)> {
    if args.contains('=') {
        split_respecting_quotes(args)
            .into_iter()
            .filter_map(|token| {
                let (name, value) = token.split_once('=')?;
                Some((name.to_string(), unquote(value)))
            })
            .collect()
    } else {
        // Legacy form: the first token is the name, the rest the value.
        match args.split_once(char::is_whitespace) {
            Some((name, value)) => vec![(name.to_string(), unquote(value.trim()))],
            None => Vec::new(),
        }
    }
}

fn split_respecting_quotes(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    current.push(c);
                    quote = Some(c);
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
