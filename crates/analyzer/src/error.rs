use codebrief_scanner::{CollectError, ScanError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that abort a whole analysis run. Per-file failures never surface
/// here; they are logged and the file is left out of the result.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No paths given to analyze")]
    NoPaths,

    #[error("Discovery failed: {0}")]
    Discovery(#[from] ScanError),

    #[error("No analyzable files found under {}", .0.display())]
    NoAnalyzableFiles(PathBuf),

    #[error(transparent)]
    NoContent(#[from] CollectError),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to write snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
