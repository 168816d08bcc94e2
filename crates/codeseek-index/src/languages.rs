//! File selection rules: which extensions are source code and which directories are noise.

use std::path::Path;

/// Extensions (without the dot) eligible for indexing.
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "cpp", "hpp", "h", "c", "cs", "go", "rs", "php", "rb",
];

/// Directory names never descended into: VCS metadata, dependency caches, build output.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
];

/// Whether the file extension is on the source-code allow-list.
#[must_use]
pub fn is_indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext))
}

/// Whether a single directory name is on the deny-list.
#[must_use]
pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// Whether any component of a relative path is an excluded directory.
#[must_use]
pub fn has_excluded_component(rel_path: &Path) -> bool {
    rel_path
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(is_excluded_dir)
}
