//! Framework signal: filename-keyed framework configs that indicate a
//! deployable web application. A few frameworks need composite evidence
//! spanning several entries of one directory (Rails, Spring Boot), so the
//! signal accumulates per-directory state during the walk.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, VfsError};
use std::collections::HashMap;

/// Filename -> framework for the single-file detectors.
fn framework_for(filename: &str) -> Option<&'static str> {
    let fw = match filename {
        "next.config.js" | "next.config.ts" | "next.config.mjs" | "next.config.cjs" => "Next.js",
        "nuxt.config.js" | "nuxt.config.ts" | "nuxt.config.mjs" => "Nuxt.js",
        "vite.config.js" | "vite.config.ts" | "vite.config.mjs" => "Vite",
        "webpack.config.js" | "webpack.config.ts" => "Webpack",
        "angular.json" | ".angular-cli.json" => "Angular",
        "vue.config.js" | "vue.config.ts" => "Vue.js",
        "svelte.config.js" | "svelte.config.ts" => "SvelteKit",
        "remix.config.js" | "remix.config.ts" => "Remix",
        "astro.config.js" | "astro.config.ts" | "astro.config.mjs" => "Astro",
        "gatsby-config.js" | "gatsby-config.ts" => "Gatsby",
        ".eleventy.js" | "eleventy.config.js" => "Eleventy",
        "nest-cli.json" => "NestJS",
        "manage.py" => "Django",
        "artisan" => "Laravel",
        "mix.exs" => "Phoenix",
        "Caddyfile" => "Caddy",
        _ => return None,
    };
    Some(fw)
}

fn is_hugo_config(filename: &str) -> bool {
    matches!(
        filename,
        "hugo.toml" | "hugo.yaml" | "config.toml" | "config.yaml"
    )
}

fn is_spring_indicator(filename: &str) -> bool {
    matches!(
        filename,
        "application.properties" | "application.yml" | "application.yaml"
    )
}

/// Observations accumulated for one directory.
#[derive(Default)]
struct DirEvidence {
    // Single-file matches in observation order: (framework, config path).
    single: Vec<(&'static str, String)>,
    // Composite evidence.
    has_app_dir: bool,
    config_ru: Option<String>,
    pom: Option<String>,
    gradle: Option<String>,
    spring_indicator: bool,
    hugo_config: Option<String>,
}

impl DirEvidence {
    /// All frameworks detected for the directory, single-file matches
    /// first, then the composite ones.
    fn matches(&self) -> Vec<(&'static str, String)> {
        let mut matches = self.single.clone();

        // Rails needs both an app/ directory and a rackup file.
        if self.has_app_dir {
            if let Some(config_ru) = &self.config_ru {
                matches.push(("Rails", config_ru.clone()));
            }
        }

        // Spring Boot: a JVM build file plus an application config.
        if self.spring_indicator {
            if let Some(build_file) = self.pom.as_ref().or(self.gradle.as_ref()) {
                matches.push(("Spring Boot", build_file.clone()));
            }
        }

        if let Some(hugo_config) = &self.hugo_config {
            matches.push(("Hugo", hugo_config.clone()));
        }

        matches
    }
}

pub struct FrameworkSignal {
    dir_order: Vec<String>,
    evidence: HashMap<String, DirEvidence>,
}

impl FrameworkSignal {
    pub fn new() -> Self {
        Self {
            dir_order: Vec::new(),
            evidence: HashMap::new(),
        }
    }

    fn dir_evidence(&mut self, dir: &str) -> &mut DirEvidence {
        if !self.evidence.contains_key(dir) {
            self.dir_order.push(dir.to_string());
        }
        self.evidence.entry(dir.to_string()).or_default()
    }
}

impl Default for FrameworkSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceSignal for FrameworkSignal {
    fn id(&self) -> &'static str {
        "framework"
    }

    fn confidence(&self) -> u8 {
        85
    }

    fn reset(&mut self) {
        self.dir_order.clear();
        self.evidence.clear();
    }

    fn observe_entry(
        &mut self,
        _ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError> {
        if entry.is_dir {
            if entry.name == "app" {
                self.dir_evidence(parent_path).has_app_dir = true;
            }
            return Ok(());
        }

        let path = paths::join(parent_path, &entry.name);

        if let Some(framework) = framework_for(&entry.name) {
            self.dir_evidence(parent_path).single.push((framework, path));
            return Ok(());
        }

        match entry.name.as_str() {
            "config.ru" => self.dir_evidence(parent_path).config_ru = Some(path),
            "pom.xml" => self.dir_evidence(parent_path).pom = Some(path),
            "build.gradle" | "build.gradle.kts" => {
                let evidence = self.dir_evidence(parent_path);
                if evidence.gradle.is_none() {
                    evidence.gradle = Some(path);
                }
            }
            name if is_spring_indicator(name) => {
                self.dir_evidence(parent_path).spring_indicator = true;
            }
            name if is_hugo_config(name) => {
                let evidence = self.dir_evidence(parent_path);
                if evidence.hugo_config.is_none() {
                    evidence.hugo_config = Some(path);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for dir in &self.dir_order {
            for (_, config_path) in self.evidence[dir].matches() {
                services.push(Service {
                    name: ctx.dir_name(dir),
                    network: Network::Public,
                    runtime: Runtime::Continuous,
                    build: Build::FromSource,
                    build_path: dir.clone(),
                    image: String::new(),
                    configs: vec![ConfigRef::new("framework", config_path)],
                });
            }
        }

        Ok(services)
    }
}
