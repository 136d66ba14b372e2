//! Relative path helpers shared by the scanner and the orchestrator.
//!
//! All paths that end up in [`crate::FileMetadata`] or as keys of
//! [`crate::ProjectContext::code_insights`] are `/`-separated and relative to
//! the project root.

use std::path::{Component, Path};

/// Render `path` relative to `root`. Paths outside the root are rendered as
/// given, still `/`-separated.
pub fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Number of directories between the root and the file (`a.ts` -> 0,
/// `src/a.ts` -> 1).
pub fn depth(relative: &str) -> usize {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .count()
        .saturating_sub(1)
}

/// Final segment of a relative path.
pub fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}
