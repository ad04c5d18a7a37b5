//! Environment extraction: content-based, sensitivity-classified
//! environment variables per service.

pub mod classify;
mod extractor;
pub mod extractors;
mod types;

pub use extractor::EnvExtractor;
pub use types::{dedupe_by_name, EnvResult, EnvType};

use crate::discovery::Service;
use crate::vfs::{Vfs, WalkControl};
use std::collections::HashSet;
use tracing::debug;

/// Maximum file size fed to the content extractors. Larger files are
/// almost certainly artifacts, not configuration.
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Extracts the environment variables a service requires by walking its
/// build path. Other services' build paths are skipped so sibling
/// services in a monorepo do not bleed into each other; results are
/// deduplicated by name, highest confidence winning.
pub fn extract_service_env(
    vfs: &dyn Vfs,
    service: &Service,
    all_services: &[Service],
) -> Vec<EnvResult> {
    if service.build_path.is_empty() {
        return Vec::new();
    }

    let other_paths: HashSet<&str> = all_services
        .iter()
        .filter(|s| s.name != service.name)
        .map(|s| s.build_path.as_str())
        .filter(|p| !p.is_empty() && *p != service.build_path)
        .collect();

    let extractor = EnvExtractor::with_defaults();
    let mut collected: Vec<EnvResult> = Vec::new();

    let walk_result = vfs.walk(&service.build_path, &mut |path, info| {
        if info.is_dir {
            if other_paths.contains(path) {
                return WalkControl::SkipDir;
            }
            return WalkControl::Continue;
        }

        match vfs.read_file(path) {
            Ok(content) if content.len() as u64 <= MAX_FILE_SIZE => {
                collected.extend(extractor.extract(path, &content));
            }
            Ok(_) => debug!(%path, "skipping oversized file"),
            Err(e) => debug!(%path, error = %e, "skipping unreadable file"),
        }
        WalkControl::Continue
    });

    if let Err(e) = walk_result {
        debug!(service = %service.name, error = %e, "env walk failed");
    }

    dedupe_by_name(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Build, ConfigRef, Network, Runtime};
    use crate::vfs::MemoryVfs;

    fn service(name: &str, build_path: &str) -> Service {
        Service {
            name: name.to_string(),
            network: Network::Private,
            runtime: Runtime::Continuous,
            build: Build::FromSource,
            build_path: build_path.to_string(),
            image: String::new(),
            configs: vec![ConfigRef::new("dockerfile", "x")],
        }
    }

    #[test]
    fn test_walks_build_path() {
        let vfs = MemoryVfs::new();
        vfs.add_file("api/.env", "DATABASE_URL=postgres://u:p@h/db\n");
        vfs.add_file("api/server.js", "const p = process.env.PORT;");

        let api = service("api", "./api");
        let results = extract_service_env(&vfs, &api, &[api.clone()]);

        let names: Vec<&str> = results.iter().map(|r| r.var_name.as_str()).collect();
        assert!(names.contains(&"DATABASE_URL"));
        assert!(names.contains(&"PORT"));
    }

    #[test]
    fn test_skips_other_service_paths() {
        let vfs = MemoryVfs::new();
        vfs.add_file("services/api/.env", "API_ONLY=1\n");
        vfs.add_file("services/api/worker/.env", "WORKER_ONLY=1\n");

        let api = service("api", "./services/api");
        let worker = service("worker", "./services/api/worker");
        let all = vec![api.clone(), worker.clone()];

        let api_results = extract_service_env(&vfs, &api, &all);
        let names: Vec<&str> = api_results.iter().map(|r| r.var_name.as_str()).collect();
        assert!(names.contains(&"API_ONLY"));
        assert!(!names.contains(&"WORKER_ONLY"));
    }

    #[test]
    fn test_image_only_service_has_no_env() {
        let vfs = MemoryVfs::new();
        let mut redis = service("redis", "");
        redis.build = Build::FromImage;

        assert!(extract_service_env(&vfs, &redis, &[redis.clone()]).is_empty());
    }

    #[test]
    fn test_dedupes_across_files() {
        let vfs = MemoryVfs::new();
        vfs.add_file("app/.env", "PORT=3000\n");
        vfs.add_file("app/index.js", "process.env.PORT");

        let app = service("app", "./app");
        let results = extract_service_env(&vfs, &app, &[app.clone()]);

        assert_eq!(results.iter().filter(|r| r.var_name == "PORT").count(), 1);
        let port = results.iter().find(|r| r.var_name == "PORT").unwrap();
        assert_eq!(port.value, "3000");
    }
}
