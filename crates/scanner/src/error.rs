use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// A file-system operation failed; always carries the offending path.
#[derive(Error, Debug)]
#[error("{op} failed for {}: {source}", path.display())]
pub struct FsError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FsError {
    pub fn new(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn not_found(op: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::new(
            op,
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        )
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Project root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Project root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Path is outside the project root: {}", .0.display())]
    OutsideRoot(PathBuf),

    #[error(transparent)]
    Fs(#[from] FsError),
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token counting failed: {0}")]
    Count(String),
}

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("No content collected: {considered} candidate files, none fit within {ceiling} tokens")]
    NoContentCollected { considered: usize, ceiling: usize },
}
