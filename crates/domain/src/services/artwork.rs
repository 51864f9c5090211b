//! Artwork file storage.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use shared::validation::sanitize_file_name;

/// Error type for artwork storage.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("Artwork not found: {0}")]
    NotFound(String),

    #[error("Artwork too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage for uploaded card artwork.
#[async_trait::async_trait]
pub trait ArtworkStore: Send + Sync {
    /// Stores `bytes` under a unique name derived from `file_name` and returns its path.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ArtworkError>;

    /// Reads the artwork stored at `path`.
    async fn open(&self, path: &str) -> Result<Vec<u8>, ArtworkError>;

    /// Deletes the artwork at `path`. Deleting an absent file succeeds.
    async fn delete(&self, path: &str) -> Result<(), ArtworkError>;
}

/// Unique stored name for an upload: `{uuid}_{sanitized name}`.
pub fn unique_file_name(file_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Artwork store kept in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryArtworkStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MemoryArtworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deleting `path` fail with an I/O error.
    pub fn fail_delete_of(&self, path: &str) {
        self.failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ArtworkStore for MemoryArtworkStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ArtworkError> {
        let path = format!("memory://{}", unique_file_name(file_name));
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn open(&self, path: &str) -> Result<Vec<u8>, ArtworkError> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| ArtworkError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), ArtworkError> {
        let failing = self
            .failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path);
        if failing {
            return Err(ArtworkError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("cannot delete {}", path),
            )));
        }
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
        Ok(())
    }
}
