use crate::error::FsError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub type FsResult<T> = std::result::Result<T, FsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets and the like; never followed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

/// File-system access used by discovery and content collection.
///
/// Every call returns a `Result`; failures carry the offending path.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &Path) -> FsResult<String>;

    async fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>>;

    async fn is_directory(&self, path: &Path) -> FsResult<bool>;

    async fn exists(&self, path: &Path) -> bool;

    async fn file_size(&self, path: &Path) -> FsResult<u64>;
}

/// [`FileSystem`] over the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &Path) -> FsResult<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FsError::new("read_file", path, e))?;
        String::from_utf8(bytes).map_err(|e| {
            FsError::new(
                "read_file",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    async fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| FsError::new("read_dir", path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| FsError::new("read_dir", path, e))?
        {
            let kind = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => EntryKind::Directory,
                Ok(ft) if ft.is_file() => EntryKind::File,
                Ok(_) => EntryKind::Other,
                Err(e) => {
                    log::debug!("Cannot stat {}: {e}", entry.path().display());
                    EntryKind::Other
                }
            };
            entries.push(DirEntry {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn is_directory(&self, path: &Path) -> FsResult<bool> {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .map_err(|e| FsError::new("is_directory", path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn file_size(&self, path: &Path) -> FsResult<u64> {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.len())
            .map_err(|e| FsError::new("file_size", path, e))
    }
}

/// In-memory [`FileSystem`] for tests and dry runs.
///
/// Directories are implied by file paths. Individual paths can be marked as
/// unreadable to exercise error handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Reads of this file or listing of this directory fail.
    #[must_use]
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn check_readable(&self, op: &'static str, path: &Path) -> FsResult<()> {
        if self.unreadable.contains(path) {
            return Err(FsError::new(
                op,
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_file(&self, path: &Path) -> FsResult<String> {
        self.check_readable("read_file", path)?;
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::not_found("read_file", path))
    }

    async fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        self.check_readable("read_dir", path)?;
        if !self.is_dir(path) {
            return Err(FsError::not_found("read_dir", path));
        }

        let mut children: BTreeMap<String, EntryKind> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let kind = if components.next().is_some() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            children.entry(name).or_insert(kind);
        }

        Ok(children
            .into_iter()
            .map(|(name, kind)| DirEntry {
                path: path.join(&name),
                name,
                kind,
            })
            .collect())
    }

    async fn is_directory(&self, path: &Path) -> FsResult<bool> {
        if self.is_dir(path) {
            Ok(true)
        } else if self.files.contains_key(path) {
            Ok(false)
        } else {
            Err(FsError::not_found("is_directory", path))
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.is_dir(path)
    }

    async fn file_size(&self, path: &Path) -> FsResult<u64> {
        self.files
            .get(path)
            .map(|content| content.len() as u64)
            .ok_or_else(|| FsError::not_found("file_size", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn memory_fs_lists_implied_directories() {
        let fs = MemoryFileSystem::new()
            .with_file("/p/package.json", "{}")
            .with_file("/p/src/a.ts", "x")
            .with_file("/p/src/lib/b.ts", "y");

        let entries = fs.read_dir(Path::new("/p/src")).await.unwrap();
        let listed: Vec<(&str, EntryKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            listed,
            vec![("a.ts", EntryKind::File), ("lib", EntryKind::Directory)]
        );
        assert!(fs.is_directory(Path::new("/p")).await.unwrap());
        assert!(!fs.is_directory(Path::new("/p/src/a.ts")).await.unwrap());
        assert_eq!(fs.file_size(Path::new("/p/src/a.ts")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn memory_fs_unreadable_paths_fail_with_path() {
        let fs = MemoryFileSystem::new()
            .with_file("/p/secret.ts", "x")
            .with_unreadable("/p/secret.ts");

        let err = fs.read_file(Path::new("/p/secret.ts")).await.unwrap_err();
        assert_eq!(err.path, PathBuf::from("/p/secret.ts"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn local_fs_reads_sorted_entries() {
        let temp = tempdir().unwrap();
        tokio::fs::write(temp.path().join("b.rs"), "fn b() {}").await.unwrap();
        tokio::fs::create_dir(temp.path().join("a")).await.unwrap();

        let fs = LocalFileSystem;
        let entries = fs.read_dir(temp.path()).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.rs"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);

        let content = fs.read_file(&temp.path().join("b.rs")).await.unwrap();
        assert_eq!(content, "fn b() {}");
        assert!(fs.exists(&temp.path().join("b.rs")).await);
        assert!(fs.read_file(&temp.path().join("missing.rs")).await.is_err());
    }
}
