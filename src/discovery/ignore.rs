//! Ignore policy applied to directory names before descending.

/// Dependency trees, build outputs, and other directories that never hold
/// deployable service definitions of their own.
const EXCLUDED_DIRS: &[&str] = &[
    // Dependencies
    "node_modules",
    "vendor",
    "bower_components",
    "venv",
    "env",
    "target",
    "deps",
    "_build",
    // Build outputs
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    ".output",
    "public",
    "static",
    "assets",
    ".netlify",
    "bin",
    "obj",
    "Debug",
    "Release",
    "x64",
    "x86",
    // OS artifacts
    "Thumbs.db",
    "Desktop.ini",
    // Temporary
    "tmp",
    "temp",
    "cache",
    "logs",
    "coverage",
    // Usually not services
    "man",
    "examples",
    "test",
    "tests",
];

/// Dot-directories that do carry deployment configs.
const INCLUDED_DOT_DIRS: &[&str] = &[".do", ".vercel"];

/// True when the walk should not descend into a directory with this name.
/// Names are matched case-insensitively; `_`- and `.`-prefixed names are
/// ignored unless explicitly included.
pub fn should_ignore_directory(name: &str) -> bool {
    if EXCLUDED_DIRS.iter().any(|p| name.eq_ignore_ascii_case(p)) {
        return true;
    }

    if name.starts_with('_') {
        return true;
    }

    // "." itself (the walk root) is never ignored.
    if name.starts_with('.') && name.len() > 1 && !INCLUDED_DOT_DIRS.contains(&name) {
        return true;
    }

    false
}
