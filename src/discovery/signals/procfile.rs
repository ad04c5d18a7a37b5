//! Heroku Procfile signal: one service per declared process type.

use crate::discovery::service::{Build, ConfigRef, Network, Runtime, Service};
use crate::discovery::signal::{DiscoverContext, ServiceSignal};
use crate::vfs::{paths, DirEntry, Vfs, VfsError};
use std::sync::Arc;

pub struct HerokuProcfileSignal {
    vfs: Arc<dyn Vfs>,
    found: Vec<(String, String)>,
}

impl HerokuProcfileSignal {
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self {
            vfs,
            found: Vec::new(),
        }
    }
}

impl ServiceSignal for HerokuProcfileSignal {
    fn id(&self) -> &'static str {
        "heroku-procfile"
    }

    fn confidence(&self) -> u8 {
        85
    }

    fn reset(&mut self) {
        self.found.clear();
    }

    fn observe_entry(
        &mut self,
        _ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError> {
        if !entry.is_dir && entry.name.eq_ignore_ascii_case("Procfile") {
            let path = paths::join(parent_path, &entry.name);
            self.found.push((path, parent_path.to_string()));
        }
        Ok(())
    }

    fn generate_services(&mut self, _ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError> {
        let mut services = Vec::new();

        for (config_path, dir) in &self.found {
            let content = self.vfs.read_to_string(config_path)?;

            for (process_type, command) in parse_procfile(&content) {
                services.push(Service {
                    name: process_type.clone(),
                    network: process_network(&process_type),
                    runtime: process_runtime(&process_type, &command),
                    build: Build::FromSource,
                    build_path: dir.clone(),
                    image: String::new(),
                    configs: vec![ConfigRef::new("procfile", config_path.clone())],
                });
            }
        }

        Ok(services)
    }
}

/// Parses `type: command` lines, skipping blanks and comments. Both sides
/// are trimmed after splitting, so padded process types still normalize.
fn parse_procfile(content: &str) -> Vec<(String, String)> {
    let mut processes = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((process_type, command)) = line.split_once(':') else {
            continue;
        };
        let process_type = process_type.trim();
        let command = command.trim();
        if process_type.is_empty() || command.is_empty() {
            continue;
        }
        processes.push((process_type.to_string(), command.to_string()));
    }
    processes
}

fn process_network(process_type: &str) -> Network {
    if process_type == "web" {
        Network::Public
    } else {
        Network::Private
    }
}

fn process_runtime(process_type: &str, command: &str) -> Runtime {
    if process_type == "scheduler"
        || process_type == "cron"
        || command.contains("cron")
        || command.contains("schedule")
    {
        Runtime::Scheduled
    } else {
        Runtime::Continuous
    }
}
