use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Image cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),
}

/// Image bytes written to disk but not yet visible under any key.
#[derive(Debug)]
pub struct StagedImage {
    temp: NamedTempFile,
    len: usize,
}

/// Photo bytes on disk, one file per cache key.
#[derive(Debug, Clone)]
pub struct ImageCache {
    root: Arc<PathBuf>,
}

impl ImageCache {
    /// Open (and create if needed) a cache rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a key. Keys that sanitize to nothing (`..`, `/`) are rejected.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let file_name = sanitize_filename::sanitize(key);
        if file_name.is_empty() || file_name.chars().all(|c| c == '.') {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(file_name))
    }

    /// Cached bytes for `key`, `None` on a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        match self.path_for(key) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Atomically write `bytes` under `key`, replacing whatever was there.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let staged = self.stage(bytes).await?;
        self.persist(staged, key)
    }

    /// Write `bytes` to a temp file in the cache root without publishing them under a key.
    ///
    /// Dropping the returned [`StagedImage`] removes the temp file.
    pub async fn stage(&self, bytes: &[u8]) -> Result<StagedImage, CacheError> {
        // Same directory as the destination, so the rename stays on one filesystem.
        let temp = NamedTempFile::new_in(self.root.as_path())?;
        fs::write(temp.path(), bytes).await?;
        Ok(StagedImage {
            temp,
            len: bytes.len(),
        })
    }

    /// Publish staged bytes under `key` with a rename.
    pub fn persist(&self, staged: StagedImage, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        staged
            .temp
            .persist(&path)
            .map_err(|e| CacheError::Io(e.error))?;
        debug!("Cached {} bytes for {key}", staged.len);
        Ok(())
    }

    /// Delete the bytes for `key`. A missing file is not an error.
    pub async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Evict, logging instead of failing. Used on cascading deletes.
    pub async fn evict_logged(&self, key: &str) {
        if let Err(e) = self.evict(key).await {
            warn!("Could not evict cached image {key}: {e}");
        }
    }
}
