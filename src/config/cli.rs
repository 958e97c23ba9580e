use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Filesystem storage. Relative paths resolve against `base_path`,
/// absolute paths are used as given.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(Path::new(path))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        tracing::debug!("Reading {}", full_path.display());
        Ok(tokio::fs::read(full_path).await?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::debug!("Writing {} bytes to {}", data.len(), full_path.display());
        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
