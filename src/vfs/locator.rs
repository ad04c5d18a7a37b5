//! Source locator: turns a user-supplied URI into a VFS plus the walk root
//! and a display name for root-level services.

use super::{paths, GithubVfs, GitVfs, LocalVfs, Vfs, VfsError};
use crate::config::TurnoutConfig;
use std::sync::Arc;

/// A resolved source: the filesystem, the path discovery walks from, and
/// the name used for services discovered at the walk root.
pub struct ResolvedSource {
    pub vfs: Arc<dyn Vfs>,
    pub root: String,
    pub root_name: String,
}

/// Resolves a source URI:
///
/// - bare path or `file://path` → local directory
/// - `github://owner/repo[/tree/ref[/subpath]]` → archive
/// - `git://host/owner/repo[#ref]` → shallow clone
/// - `git://owner/repo` → GitHub shorthand clone
pub fn resolve_source(uri: &str, config: &TurnoutConfig) -> Result<ResolvedSource, VfsError> {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Ok(local_source(uri));
    };

    match scheme {
        "file" => Ok(local_source(rest)),
        "github" => resolve_github(rest, config),
        "git" => resolve_git(rest),
        other => Err(VfsError::InvalidInput(format!(
            "unsupported scheme: {}",
            other
        ))),
    }
}

fn local_source(path: &str) -> ResolvedSource {
    let root_name = std::fs::canonicalize(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| paths::base(path).to_string());

    ResolvedSource {
        vfs: Arc::new(LocalVfs::new()),
        root: path.to_string(),
        root_name,
    }
}

fn resolve_github(rest: &str, config: &TurnoutConfig) -> Result<ResolvedSource, VfsError> {
    let parts: Vec<&str> = rest.trim_matches('/').split('/').collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(VfsError::InvalidInput(
            "expected github://owner/repo[/tree/ref[/subpath]]".to_string(),
        ));
    }

    let owner = parts[0];
    let repo = parts[1];
    let mut ref_name = "";
    let mut subpath = String::new();

    if parts.len() >= 4 && parts[2] == "tree" {
        ref_name = parts[3];
        if parts.len() > 4 {
            subpath = parts[4..].join("/");
        }
    } else if parts.len() > 2 {
        return Err(VfsError::InvalidInput(
            "expected github://owner/repo[/tree/ref[/subpath]]".to_string(),
        ));
    }

    let root_name = if subpath.is_empty() {
        repo.to_string()
    } else {
        paths::base(&subpath).to_string()
    };

    let vfs = GithubVfs::with_base_path(
        owner,
        repo,
        ref_name,
        &subpath,
        config.github_token.clone(),
    )
    .with_timeout(config.fetch_timeout);

    Ok(ResolvedSource {
        vfs: Arc::new(vfs),
        root: ".".to_string(),
        root_name,
    })
}

fn resolve_git(rest: &str) -> Result<ResolvedSource, VfsError> {
    let (location, ref_name) = match rest.split_once('#') {
        Some((loc, r)) => (loc, r),
        None => (rest, ""),
    };

    let parts: Vec<&str> = location.trim_matches('/').split('/').collect();
    if parts.len() < 2 || parts[0].is_empty() {
        return Err(VfsError::InvalidInput(
            "expected git://host/owner/repo or git://owner/repo".to_string(),
        ));
    }

    // A dotted first segment is a real host; otherwise treat the URI as
    // GitHub shorthand (git://owner/repo).
    let (repo_url, repo) = if parts[0].contains('.') {
        let url = format!("https://{}", location.trim_matches('/'));
        (url, parts[parts.len() - 1].to_string())
    } else {
        if parts.len() != 2 {
            return Err(VfsError::InvalidInput(
                "expected git://owner/repo for the GitHub shorthand".to_string(),
            ));
        }
        let url = format!("https://github.com/{}/{}", parts[0], parts[1]);
        (url, parts[1].to_string())
    };

    let root_name = repo.trim_end_matches(".git").to_string();
    let vfs = GitVfs::new(&repo_url, ref_name)?;

    Ok(ResolvedSource {
        vfs: Arc::new(vfs),
        root: ".".to_string(),
        root_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TurnoutConfig {
        TurnoutConfig::default()
    }

    #[test]
    fn test_bare_path_is_local() {
        let source = resolve_source("/tmp", &config()).unwrap();
        assert_eq!(source.root, "/tmp");
    }

    #[test]
    fn test_file_scheme() {
        let source = resolve_source("file:///tmp", &config()).unwrap();
        assert_eq!(source.root, "/tmp");
    }

    #[test]
    fn test_github_uri() {
        let source = resolve_source("github://acme/widgets", &config()).unwrap();
        assert_eq!(source.root, ".");
        assert_eq!(source.root_name, "widgets");
    }

    #[test]
    fn test_github_uri_with_subpath() {
        let source =
            resolve_source("github://acme/monorepo/tree/main/services/api", &config()).unwrap();
        assert_eq!(source.root, ".");
        assert_eq!(source.root_name, "api");
    }

    #[test]
    fn test_github_uri_malformed() {
        assert!(matches!(
            resolve_source("github://acme", &config()),
            Err(VfsError::InvalidInput(_))
        ));
        assert!(matches!(
            resolve_source("github://acme/repo/branch", &config()),
            Err(VfsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_git_uri_with_host() {
        let source = resolve_source("git://gitlab.com/acme/widgets#dev", &config()).unwrap();
        assert_eq!(source.root, ".");
        assert_eq!(source.root_name, "widgets");
    }

    #[test]
    fn test_git_shorthand() {
        let source = resolve_source("git://acme/widgets", &config()).unwrap();
        assert_eq!(source.root_name, "widgets");
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            resolve_source("svn://host/repo", &config()),
            Err(VfsError::InvalidInput(_))
        ));
    }
}
