//! Package signal: dependency manifests mapped to framework labels. The
//! weakest evidence band, since dependencies may be unused or transitive.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Manifest kinds, in emission order within one directory.
const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "go.mod",
    "Cargo.toml",
    "composer.json",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "Package.swift",
    "mix.exs",
];

#[derive(Debug, Clone, Copy)]
struct DetectedFramework {
    network: Network,
}

impl DetectedFramework {
    const PUBLIC: Self = Self {
        network: Network::Public,
    };
    const PRIVATE: Self = Self {
        network: Network::Private,
    };
}

pub struct PackageSignal {
    vfs: Arc<dyn Vfs>,
    // Directories in walk order, each with filename -> manifest path.
    dir_order: Vec<String>,
    manifests: HashMap<String, HashMap<String, String>>,
}

impl PackageSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            dir_order: Vec::new(),
            manifests: HashMap::new(),
        }
    }

    /// Every manifest in the directory whose dependencies map to a known
    /// framework contributes a match; the triangulator unions the evidence
    /// into one service per name.
    fn analyze_dir(&self, files: &HashMap<String, String>) -> Vec<(String, DetectedFramework)> {
        let mut matches = Vec::new();

        for filename in MANIFEST_FILES {
            if let Some(path) = files.get(*filename) {
                if let Some(detected) = self.analyze_manifest(filename, path) {
                    matches.push((path.clone(), detected));
                }
            }
        }

        // At most one .csproj per directory, lowest filename first.
        let mut csproj_files: Vec<(&String, &String)> = files
            .iter()
            .filter(|(filename, _)| filename.to_lowercase().ends_with(".csproj"))
            .collect();
        csproj_files.sort();
        if let Some((_, path)) = csproj_files.first() {
            if let Some(detected) = self.analyze_manifest("csproj", path) {
                matches.push(((*path).clone(), detected));
            }
        }

        matches
    }

    fn analyze_manifest(&self, kind: &str, path: &str) -> Option<DetectedFramework> {
        let content = self.vfs.read_to_string(path).ok()?;
        match kind {
            "package.json" => analyze_package_json(&content),
            "requirements.txt" => analyze_requirements(&content),
            "pyproject.toml" => analyze_pyproject(&content),
            "go.mod" => Some(analyze_go_mod(&content)),
            "Cargo.toml" => Some(analyze_cargo(&content)),
            "composer.json" => Some(DetectedFramework::PUBLIC),
            "Gemfile" => Some(DetectedFramework::PUBLIC),
            "pom.xml" | "build.gradle" | "build.gradle.kts" => Some(DetectedFramework::PUBLIC),
            "Package.swift" => Some(DetectedFramework::PUBLIC),
            "mix.exs" => Some(DetectedFramework::PUBLIC),
            "csproj" => Some(DetectedFramework::PUBLIC),
            _ => None,
        }
    }
}

fn analyze_package_json(content: &str) -> Option<DetectedFramework> {
    #[derive(Deserialize)]
    struct PackageJson {
        #[serde(default)]
        dependencies: HashMap<String, String>,
        #[serde(default, rename = "devDependencies")]
        dev_dependencies: HashMap<String, String>,
    }

    let parsed: PackageJson = serde_json::from_str(content).ok()?;
    let has = |name: &str| {
        parsed.dependencies.contains_key(name) || parsed.dev_dependencies.contains_key(name)
    };

    // Meta-frameworks, static-site generators, servers, then UI libraries;
    // priority mirrors how specific the evidence is.
    let web_deps = [
        "next",
        "nuxt",
        "@remix-run/react",
        "@sveltejs/kit",
        "astro",
        "gatsby",
        "@docusaurus/core",
        "vite",
        "webpack",
        "parcel",
        "express",
        "fastify",
        "koa",
        "@nestjs/core",
        "@apollo/server",
        "react",
        "vue",
        "svelte",
        "@angular/core",
    ];
    if web_deps.iter().any(|d| has(d)) {
        return Some(DetectedFramework::PUBLIC);
    }

    // Desktop shells are deployable but not web-facing.
    if has("electron") || has("@tauri-apps/api") {
        return Some(DetectedFramework::PRIVATE);
    }

    None
}

fn analyze_requirements(content: &str) -> Option<DetectedFramework> {
    let lower = content.to_lowercase();
    let web_deps = [
        "django",
        "flask",
        "fastapi",
        "tornado",
        "sanic",
        "starlette",
        "streamlit",
        "gradio",
    ];
    if web_deps.iter().any(|d| lower.contains(d)) {
        return Some(DetectedFramework::PUBLIC);
    }
    None
}

fn analyze_pyproject(content: &str) -> Option<DetectedFramework> {
    let lower = content.to_lowercase();
    if ["django", "fastapi", "flask"].iter().any(|d| lower.contains(d)) {
        return Some(DetectedFramework::PUBLIC);
    }
    // A pyproject without a known web framework is still a Python project.
    Some(DetectedFramework::PUBLIC)
}

fn analyze_go_mod(_content: &str) -> DetectedFramework {
    // Specific routers (gin, fiber, echo, chi) and generic Go services
    // all deploy the same way.
    DetectedFramework::PUBLIC
}

fn analyze_cargo(content: &str) -> DetectedFramework {
    // Desktop-first crates are the only non-web case worth separating.
    if content.contains("tauri") || content.contains("egui") {
        DetectedFramework::PRIVATE
    } else {
        DetectedFramework::PUBLIC
    }
}

impl ServiceSignal for PackageSignal {
    fn id(&self) -> &'static str {
        "package"
    }

    fn confidence(&self) -> u8 {
        50
    }

    fn reset(&mut self) {
        self.dir_order.clear();
        self.manifests.clear();
    }

    fn observe_entry(
        &mut self,
        _ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError> {
        if entry.is_dir {
            return Ok(());
        }

        let is_manifest = MANIFEST_FILES
            .iter()
            .any(|f| entry.name.eq_ignore_ascii_case(f))
            || entry.name.to_lowercase().ends_with(".csproj");
        if !is_manifest {
            return Ok(());
        }

        let path = paths::join(parent_path, &entry.name);
        if !self.manifests.contains_key(parent_path) {
            self.dir_order.push(parent_path.to_string());
        }
        self.manifests
            .entry(parent_path.to_string())
            .or_default()
            .insert(entry.name.clone(), path);
        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for dir in &self.dir_order {
            let files = &self.manifests[dir];
            for (config_path, detected) in self.analyze_dir(files) {
                services.push(Service {
                    name: ctx.dir_name(dir),
                    network: detected.network,
                    runtime: Runtime::Continuous,
                    build: Build::FromSource,
                    build_path: dir.clone(),
                    image: String::new(),
                    configs: vec![ConfigRef::new("package", config_path)],
                });
            }
        }

        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryVfs;

    fn run_signal(vfs: Arc<MemoryVfs>) -> Vec<Service> {
        let ctx = DiscoverContext::new(".", "repo");
        let mut signal = PackageSignal::new(vfs.clone());
        signal.reset();

        let mut stack = vec![".".to_string()];
        while let Some(dir) = stack.pop() {
            for entry in vfs.read_dir(&dir) {
                let entry = entry.unwrap();
                signal.observe_entry(&ctx, &dir, &entry).unwrap();
                if entry.is_dir {
                    stack.push(paths::join(&dir, &entry.name));
                }
            }
        }
        signal.generate_services(&ctx).unwrap()
    }

    #[test]
    fn test_next_dependency() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "package.json",
            r#"{"dependencies": {"next": "14.0.0", "react": "18.0.0"}}"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "repo");
        assert_eq!(services[0].network, Network::Public);
        assert_eq!(services[0].configs[0].config_type, "package");
        assert_eq!(services[0].configs[0].path, "./package.json");
    }

    #[test]
    fn test_gin_go_mod() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "go.mod",
            "module example.com/api\n\nrequire github.com/gin-gonic/gin v1.9.0\n",
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].network, Network::Public);
    }

    #[test]
    fn test_electron_is_private() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "package.json",
            r#"{"dependencies": {"electron": "28.0.0"}}"#,
        );

        let services = run_signal(vfs);
        assert_eq!(services[0].network, Network::Private);
    }

    #[test]
    fn test_plain_library_package_json_ignored() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "package.json",
            r#"{"dependencies": {"lodash": "4.17.21"}}"#,
        );

        assert!(run_signal(vfs).is_empty());
    }

    #[test]
    fn test_every_manifest_contributes_evidence() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "api/package.json",
            r#"{"dependencies": {"express": "4.18.0"}}"#,
        );
        vfs.add_file("api/requirements.txt", "flask==3.0\n");
        vfs.add_file(
            "frontend/package.json",
            r#"{"dependencies": {"react": "18.0.0"}}"#,
        );

        let services = run_signal(vfs);

        // One candidate per matching manifest; triangulation unions the
        // same-named candidates into one service carrying both refs.
        let api_candidates: Vec<&Service> =
            services.iter().filter(|s| s.name == "api").collect();
        assert_eq!(api_candidates.len(), 2);
        assert!(api_candidates
            .iter()
            .any(|s| s.configs[0].path == "./api/package.json"));
        assert!(api_candidates
            .iter()
            .any(|s| s.configs[0].path == "./api/requirements.txt"));

        let results = vec![crate::discovery::SignalResult {
            services,
            confidence: 50,
            signal_id: "package",
        }];
        let merged = crate::discovery::triangulate(&results);
        assert_eq!(merged.len(), 2);

        let api = merged.iter().find(|s| s.name == "api").unwrap();
        let paths: Vec<&str> = api.configs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["./api/package.json", "./api/requirements.txt"]
        );
    }

    #[test]
    fn test_csproj_detected() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file(
            "Api.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk.Web\"></Project>",
        );

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].configs[0].path, "./Api.csproj");
    }

    #[test]
    fn test_flask_requirements() {
        let vfs = Arc::new(MemoryVfs::new());
        vfs.add_file("requirements.txt", "flask==3.0.0\nredis==5.0\n");

        let services = run_signal(vfs);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].network, Network::Public);
    }
}
