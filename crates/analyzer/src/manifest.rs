use async_trait::async_trait;
use codebrief_protocol::PackageJson;
use codebrief_scanner::FileSystem;
use std::path::Path;
use std::sync::Arc;

pub const PACKAGE_JSON: &str = "package.json";

/// Best-effort access to the project's dependency manifest.
#[async_trait]
pub trait ManifestReader: Send + Sync {
    /// `None` when the manifest is absent or unreadable.
    async fn read_manifest(&self, root: &Path) -> Option<PackageJson>;
}

/// Reads `<root>/package.json` through a [`FileSystem`].
pub struct FsManifestReader {
    fs: Arc<dyn FileSystem>,
}

impl FsManifestReader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl ManifestReader for FsManifestReader {
    async fn read_manifest(&self, root: &Path) -> Option<PackageJson> {
        let path = root.join(PACKAGE_JSON);
        if !self.fs.exists(&path).await {
            log::debug!("No {PACKAGE_JSON} in {}", root.display());
            return None;
        }

        let raw = match self.fs.read_file(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Ignoring manifest: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {e}", path.display());
                None
            }
        }
    }
}
