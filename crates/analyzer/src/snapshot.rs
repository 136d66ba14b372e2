use crate::error::SnapshotError;
use async_trait::async_trait;
use codebrief_protocol::ProjectContext;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_DIR_NAME: &str = ".codebrief";
pub const SNAPSHOT_FILE_NAME: &str = "project-context.json";

/// Destination for the finished [`ProjectContext`].
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist the context and return where it went.
    async fn persist(&self, context: &ProjectContext) -> Result<PathBuf, SnapshotError>;
}

/// Writes pretty JSON to `<root>/.codebrief/project-context.json`, or to a
/// configured directory, replacing the previous snapshot atomically.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSnapshotSink {
    dir: Option<PathBuf>,
}

impl JsonFileSnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn snapshot_path(&self, project_root: &Path) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| project_root.join(SNAPSHOT_DIR_NAME))
            .join(SNAPSHOT_FILE_NAME)
    }
}

#[async_trait]
impl SnapshotSink for JsonFileSnapshotSink {
    async fn persist(&self, context: &ProjectContext) -> Result<PathBuf, SnapshotError> {
        let path = self.snapshot_path(Path::new(&context.project_root_path));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SnapshotError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(context)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| SnapshotError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SnapshotError::io(&path, e))?;
        Ok(path)
    }
}
