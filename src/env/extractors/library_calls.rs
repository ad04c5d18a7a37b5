//! Regex scanner for environment lookups in source code
//! (`process.env.X`, `os.getenv("X")`, and friends).

use super::{base_name, ContentExtractor, EnvResult};
use crate::env::classify::{classify, is_system_var};
use crate::vfs::VfsError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const SOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".ts", ".jsx", ".tsx", ".mjs", ".py", ".rb", ".php", ".java", ".kt", ".go", ".rs",
    ".cpp", ".c", ".cs", ".sh", ".bash", ".zsh", ".fish",
];

static LIBRARY_CALL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // JavaScript / TypeScript
        r"process\.env\.([A-Z_][A-Z0-9_]*)",
        // Python
        r#"os\.getenv\(['"]([A-Z_][A-Z0-9_]*)['"]\)"#,
        // Ruby
        r#"ENV\[['"]([A-Z_][A-Z0-9_]*)['"]\]"#,
        // PHP
        r#"\$_ENV\[['"]([A-Z_][A-Z0-9_]*)['"]\]"#,
        // Java
        r#"System\.getenv\("([A-Z_][A-Z0-9_]*)"\)"#,
        // Go
        r#"os\.(?:Getenv|LookupEnv)\("([A-Z_][A-Z0-9_]*)"\)"#,
        // Rust
        r#"std::env::var\("([A-Z_][A-Z0-9_]*)"\)"#,
        // Shell, avoiding comments and quoted strings
        r#"(?:^|[^#"'])\$([A-Z_][A-Z0-9_]*)"#,
        // C#
        r#"Environment\.GetEnvironmentVariable\("([A-Z_][A-Z0-9_]*)"\)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

pub struct LibraryCallExtractor;

impl ContentExtractor for LibraryCallExtractor {
    fn can_handle(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        SOURCE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Usage references, not declarations.
    fn confidence(&self) -> u8 {
        50
    }

    fn extract(&self, filename: &str, content: &[u8]) -> Result<Vec<EnvResult>, VfsError> {
        if is_test_file(filename) {
            return Ok(Vec::new());
        }
        let Ok(text) = std::str::from_utf8(content) else {
            return Ok(Vec::new());
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut results = Vec::new();

        for pattern in LIBRARY_CALL_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let name = caps[1].to_string();
                if is_system_var(&name) || !seen.insert(name.clone()) {
                    continue;
                }

                // The value is unknown from a usage site.
                let (env_type, sensitive) = classify(&name, "");
                results.push(EnvResult {
                    var_name: name,
                    value: String::new(),
                    env_type,
                    sensitive,
                    source: format!("usage:{}", filename),
                    confidence: self.confidence(),
                });
            }
        }

        Ok(results)
    }
}

fn is_test_file(filename: &str) -> bool {
    let base = base_name(filename).to_lowercase();
    base.contains("test") || base.contains("spec")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::types::EnvType;

    fn extract(filename: &str, content: &str) -> Vec<EnvResult> {
        LibraryCallExtractor
            .extract(filename, content.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_javascript() {
        let results = extract(
            "server.js",
            "const port = process.env.PORT;\nconst key = process.env.API_KEY;",
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].var_name, "PORT");
        assert_eq!(results[0].source, "usage:server.js");

        let key = results.iter().find(|r| r.var_name == "API_KEY").unwrap();
        assert_eq!(key.env_type, EnvType::Secret);
        assert!(key.sensitive);
    }

    #[test]
    fn test_python() {
        let results = extract("app.py", r#"token = os.getenv("SLACK_TOKEN")"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].var_name, "SLACK_TOKEN");
    }

    #[test]
    fn test_go_and_rust() {
        let results = extract("main.go", r#"addr := os.Getenv("LISTEN_ADDR")"#);
        assert_eq!(results[0].var_name, "LISTEN_ADDR");

        let results = extract("main.rs", r#"let v = std::env::var("RUST_BACKTRACE");"#);
        assert_eq!(results[0].var_name, "RUST_BACKTRACE");
    }

    #[test]
    fn test_shell_variable() {
        let results = extract("deploy.sh", "curl -H \"auth: $DEPLOY_TOKEN\" $ENDPOINT_URL\n");
        let names: Vec<&str> = results.iter().map(|r| r.var_name.as_str()).collect();
        assert!(names.contains(&"ENDPOINT_URL"));
    }

    #[test]
    fn test_ruby_and_php() {
        let results = extract("config.rb", "ENV['RAILS_SECRET']");
        assert_eq!(results[0].var_name, "RAILS_SECRET");

        let results = extract("index.php", r#"$_ENV["APP_DEBUG"]"#);
        assert_eq!(results[0].var_name, "APP_DEBUG");
    }

    #[test]
    fn test_test_files_skipped() {
        assert!(extract("server.test.js", "process.env.PORT").is_empty());
        assert!(extract("app_test.go", r#"os.Getenv("PORT")"#).is_empty());
        assert!(extract("thing.spec.ts", "process.env.PORT").is_empty());
    }

    #[test]
    fn test_dedup_within_file() {
        let results = extract("a.js", "process.env.PORT; process.env.PORT;");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_system_vars_skipped() {
        let results = extract("run.sh", "echo $HOME $PORT\n");
        let names: Vec<&str> = results.iter().map(|r| r.var_name.as_str()).collect();
        assert!(!names.contains(&"HOME"));
        assert!(names.contains(&"PORT"));
    }

    #[test]
    fn test_non_source_rejected() {
        assert!(!LibraryCallExtractor.can_handle("README.md"));
        assert!(LibraryCallExtractor.can_handle("lib/worker.rb"));
    }
}
