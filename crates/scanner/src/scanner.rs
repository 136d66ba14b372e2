use crate::error::{Result, ScanError};
use crate::fs::{EntryKind, FileSystem};
use codebrief_protocol::{paths, FileMetadata};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Largest file considered for analysis.
pub const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_file_size: u64,
    /// Directory names pruned in addition to the built-in skip set.
    pub extra_skip_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE_BYTES,
            extra_skip_dirs: Vec::new(),
        }
    }
}

/// Finds analyzable files under a project root.
#[derive(Clone)]
pub struct FileScanner {
    fs: Arc<dyn FileSystem>,
    options: ScanOptions,
}

impl FileScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_options(fs, ScanOptions::default())
    }

    pub fn with_options(fs: Arc<dyn FileSystem>, options: ScanOptions) -> Self {
        Self { fs, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Walk `root` and return every analyzable file, sorted.
    ///
    /// Skipped directories are pruned before their contents are listed. An
    /// unreadable directory below the root contributes no entries.
    pub async fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        self.check_root(root).await?;

        let mut files = Vec::new();
        self.walk(root, root, &mut files).await;
        files.sort();

        log::info!("Found {} analyzable files under {}", files.len(), root.display());
        Ok(files)
    }

    /// Discover from several entry points inside `root`.
    ///
    /// Directory entries are walked, file entries are kept when they pass the
    /// file filter. Relative entries resolve against `root`; the result is
    /// sorted and free of duplicates.
    pub async fn discover_paths(&self, root: &Path, entries: &[PathBuf]) -> Result<Vec<PathBuf>> {
        self.check_root(root).await?;

        let mut found = BTreeSet::new();
        for entry in entries {
            let path = if entry.is_absolute() {
                entry.clone()
            } else {
                root.join(entry)
            };
            let climbs = path
                .components()
                .any(|component| component == Component::ParentDir);
            if climbs || !path.starts_with(root) {
                return Err(ScanError::OutsideRoot(path));
            }

            if self.fs.is_directory(&path).await? {
                if self.is_skipped_below(root, &path) {
                    log::debug!("Skipping excluded entry point {}", path.display());
                    continue;
                }
                let mut files = Vec::new();
                self.walk(root, &path, &mut files).await;
                found.extend(files);
            } else if path.parent().is_some_and(|dir| self.is_skipped_below(root, dir))
                || !is_analyzable_file(&path)
            {
                log::debug!("Skipping non-analyzable entry point {}", path.display());
            } else {
                found.insert(path);
            }
        }

        log::info!("Found {} analyzable files under {}", found.len(), root.display());
        Ok(found.into_iter().collect())
    }

    /// Attach sizes and root-relative paths. Oversized or unreadable files
    /// are dropped.
    pub async fn describe(&self, root: &Path, files: &[PathBuf]) -> Vec<FileMetadata> {
        let mut described = Vec::with_capacity(files.len());
        for path in files {
            let size = match self.fs.file_size(path).await {
                Ok(size) => size,
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            };
            if size > self.options.max_file_size {
                log::debug!(
                    "Skipping large file {} ({} bytes > {})",
                    path.display(),
                    size,
                    self.options.max_file_size
                );
                continue;
            }
            described.push(FileMetadata::new(paths::relative_to(root, path), size));
        }
        described
    }

    async fn check_root(&self, root: &Path) -> Result<()> {
        if !self.fs.exists(root).await {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }
        if !self.fs.is_directory(root).await? {
            return Err(ScanError::RootNotDirectory(root.to_path_buf()));
        }
        // The root itself must be listable; deeper failures are tolerated.
        self.fs.read_dir(root).await?;
        Ok(())
    }

    async fn walk(&self, root: &Path, start: &Path, files: &mut Vec<PathBuf>) {
        let mut pending = vec![start.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let at_root = dir == root;
            let entries = match self.fs.read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Skipping unreadable directory: {e}");
                    continue;
                }
            };

            for entry in entries {
                match entry.kind {
                    EntryKind::Directory => {
                        if self.is_skipped_dir(&entry.name, at_root) {
                            log::debug!("Pruning {}", entry.path.display());
                        } else {
                            pending.push(entry.path);
                        }
                    }
                    EntryKind::File => {
                        if is_analyzable_file(&entry.path) {
                            files.push(entry.path);
                        } else {
                            log::debug!("Skipping {}", entry.path.display());
                        }
                    }
                    EntryKind::Other => {}
                }
            }
        }
    }

    /// `at_root` is true for directories directly under the project root.
    fn is_skipped_dir(&self, name: &str, at_root: bool) -> bool {
        if name.starts_with('.') {
            return true;
        }
        let lowered = name.to_lowercase();
        SKIP_DIRS.contains(&lowered.as_str())
            || (at_root && ROOT_SKIP_DIRS.contains(&lowered.as_str()))
            || self
                .options
                .extra_skip_dirs
                .iter()
                .any(|extra| extra.eq_ignore_ascii_case(name))
    }

    /// Whether `dir` or any directory between it and `root` is in the skip set.
    fn is_skipped_below(&self, root: &Path, dir: &Path) -> bool {
        let Ok(relative) = dir.strip_prefix(root) else {
            return false;
        };
        relative
            .components()
            .enumerate()
            .any(|(depth, component)| match component {
                Component::Normal(name) => self.is_skipped_dir(&name.to_string_lossy(), depth == 0),
                _ => false,
            })
    }
}

/// Deny-by-default file filter: reject known noise, then accept the
/// allow-list of extensions and exact file names.
pub fn is_analyzable_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }

    let lowered = name.to_lowercase();
    if LOCK_FILES.contains(&lowered.as_str()) {
        return false;
    }
    if is_test_file(&lowered) {
        return false;
    }
    if DENIED_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix)) {
        return false;
    }

    if ALLOWED_FILE_NAMES.contains(&name) {
        return true;
    }

    match lowered.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            !BINARY_EXTENSIONS.contains(&ext) && ALLOWED_EXTENSIONS.contains(&ext)
        }
        _ => false,
    }
}

fn is_test_file(lowered: &str) -> bool {
    let Some((stem, _ext)) = lowered.rsplit_once('.') else {
        return false;
    };
    stem.ends_with(".test")
        || stem.ends_with(".spec")
        || stem.contains(".test.")
        || stem.contains(".spec.")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || (lowered.ends_with(".py") && stem.starts_with("test_"))
}

/// Directory names pruned during the walk (compared lowercased). Any
/// dot-directory is pruned as well.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "jspm_packages",
    "dist",
    "build",
    "target",
    "vendor",
    "third_party",
    "third-party",
    "coverage",
    "htmlcov",
    "storybook-static",
    "__pycache__",
    "__tests__",
    "__mocks__",
    "__snapshots__",
    "venv",
    "site-packages",
];

/// Scratch and output directory names pruned only directly under the root;
/// deeper down they are ordinary source directories.
const ROOT_SKIP_DIRS: &[&str] = &["out", "env", "tmp", "temp", "logs"];

const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "cargo.lock",
    "poetry.lock",
    "pipfile.lock",
    "composer.lock",
    "gemfile.lock",
    "go.sum",
    "flake.lock",
    "uv.lock",
];

const DENIED_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts", ".map", ".min.js", ".min.css", ".lock"];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "pdf", "zip", "gz", "tar", "tgz",
    "7z", "rar", "exe", "dll", "so", "dylib", "a", "o", "class", "jar", "war", "wasm", "pyc",
    "pyo", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "mov", "avi", "bin", "dat", "db",
    "sqlite",
];

const ALLOWED_FILE_NAMES: &[&str] = &[
    "Dockerfile",
    "Makefile",
    "makefile",
    "Justfile",
    "Gemfile",
    "Procfile",
    "Rakefile",
    "Pipfile",
];

const ALLOWED_EXTENSIONS: &[&str] = &[
    // Languages
    "rs", "py", "pyi", "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "java", "kt", "kts",
    "go", "c", "h", "cpp", "cc", "cxx", "hpp", "cs", "rb", "swift", "php", "scala", "dart", "zig",
    "lua", "ex", "exs", "vue", "svelte", "astro",
    // Scripts
    "sh", "bash", "zsh", "ps1",
    // Docs
    "md", "mdx", "rst", "txt",
    // Config / infra
    "json", "yaml", "yml", "toml", "ini", "cfg", "xml", "html", "css", "scss", "less", "sql",
    "graphql", "gql", "proto", "tf", "hcl", "gradle",
];
