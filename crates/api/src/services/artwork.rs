//! Local filesystem artwork storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use domain::services::artwork::{unique_file_name, ArtworkError, ArtworkStore};

/// Stores artwork files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalArtworkStore {
    root: PathBuf,
}

impl LocalArtworkStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory if missing.
    pub async fn ensure_root(&self) -> Result<(), ArtworkError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads a file addressed relative to the root, such as a premade
    /// template image. Paths escaping the root are treated as missing.
    pub async fn open_relative(&self, relative: &str) -> Result<Vec<u8>, ArtworkError> {
        let relative_path = Path::new(relative.trim_start_matches(['/', '\\']));
        let safe = relative_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.trim().is_empty() {
            return Err(ArtworkError::NotFound(relative.to_string()));
        }
        read(&self.root.join(relative_path)).await
    }

    fn owned_path(&self, path: &str) -> Result<PathBuf, ArtworkError> {
        let candidate = PathBuf::from(path);
        let inside_root = candidate.starts_with(&self.root)
            && candidate
                .components()
                .all(|c| !matches!(c, Component::ParentDir));
        if inside_root {
            Ok(candidate)
        } else {
            Err(ArtworkError::NotFound(path.to_string()))
        }
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, ArtworkError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ArtworkError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ArtworkStore for LocalArtworkStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ArtworkError> {
        let path = self.root.join(unique_file_name(file_name));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored artwork");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn open(&self, path: &str) -> Result<Vec<u8>, ArtworkError> {
        read(&self.owned_path(path)?).await
    }

    async fn delete(&self, path: &str) -> Result<(), ArtworkError> {
        // Files outside the current root (e.g. after a root change) are not ours.
        let Ok(path) = self.owned_path(path) else {
            tracing::debug!(path = %path, "Artwork outside storage root, treating as absent");
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted artwork");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
