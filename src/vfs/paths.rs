//! Forward-slash path helpers shared by every VFS backend.
//!
//! The walk root for non-local backends is `"."`, and joined paths keep
//! that prefix (`join(".", "fly.toml")` is `"./fly.toml"`), so config
//! provenance paths are stable across backends.

/// Joins two path segments with a forward slash.
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        return name.to_string();
    }
    if name.is_empty() {
        return base.to_string();
    }
    let base = base.trim_end_matches('/');
    format!("{}/{}", base, name)
}

/// Last path component. `base(".")` is `"."`; `base("a/b/")` is `"b"`.
pub fn base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Everything before the last component. `dir("./fly.toml")` is `"."`;
/// `dir("fly.toml")` is `"."`.
pub fn dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None => ".",
    }
}

/// Makes `target` relative to `base` when it lives underneath it; otherwise
/// returns `target` unchanged.
pub fn rel<'a>(base: &str, target: &'a str) -> &'a str {
    if target == base {
        return ".";
    }
    let prefix = base.trim_end_matches('/');
    if let Some(rest) = target.strip_prefix(prefix) {
        let rest = rest.trim_start_matches('/');
        if !rest.is_empty() {
            return rest;
        }
        return ".";
    }
    target
}

/// Normalizes `.` segments and duplicate slashes without resolving `..`.
/// Parent segments are preserved so callers can reject them.
pub fn clean(path: &str) -> String {
    if path.is_empty() || path == "." {
        return ".".to_string();
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        parts.push(part);
    }
    if parts.is_empty() {
        return ".".to_string();
    }
    parts.join("/")
}

/// True when any segment of the path is a parent reference.
pub fn has_parent_ref(path: &str) -> bool {
    path.split('/').any(|part| part == "..")
}
