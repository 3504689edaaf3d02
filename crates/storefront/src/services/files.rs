//! Upload storage.
//!
//! Files are stored flat under a single root directory, keyed by the
//! client-supplied filename. Names must be a single path component.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from file storage.
#[derive(Debug, Error)]
pub enum FileError {
    /// The filename is empty or could escape the storage directory.
    #[error("invalid filename")]
    InvalidName,

    /// No stored file has this name.
    #[error("file not found")]
    NotFound,

    /// Filesystem error.
    #[error("file storage error: {0}")]
    Io(#[from] io::Error),
}

/// Check that `name` is a plain filename.
///
/// Rejects empty names, path separators, NUL, `.`/`..` and dotfiles.
///
/// # Errors
///
/// Returns `FileError::InvalidName` if the name is unsafe.
pub fn sanitize_filename(name: &str) -> Result<&str, FileError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));

    if invalid {
        return Err(FileError::InvalidName);
    }
    Ok(name)
}

/// Flat file storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is not touched until
    /// [`Self::ensure_root`] or the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `FileError::Io` if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), FileError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, FileError> {
        Ok(self.root.join(sanitize_filename(name)?))
    }

    /// Store `bytes` under `name`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `FileError::InvalidName` for unsafe names.
    /// Returns `FileError::Io` if the write fails.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), FileError> {
        let path = self.path_for(name)?;
        self.ensure_root().await?;
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(filename = name, size = bytes.len(), "Stored uploaded file");
        Ok(())
    }

    /// Read the file stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `FileError::InvalidName` for unsafe names.
    /// Returns `FileError::NotFound` if there is no such file.
    pub async fn open(&self, name: &str) -> Result<Vec<u8>, FileError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(e) => Err(FileError::Io(e)),
        }
    }
}
