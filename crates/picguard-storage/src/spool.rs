//! Request spool
//!
//! Uploads are streamed chunk by chunk into an anonymous file in the spool
//! directory. The file is unlinked when the [`TempPath`] is dropped, which
//! covers every exit path of a request, including panics and cancellation.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{StorageError, StorageResult};

/// The spool directory. Never served.
#[derive(Clone, Debug)]
pub struct SpoolDir {
    dir: PathBuf,
}

impl SpoolDir {
    /// Create the directory if it does not exist.
    pub async fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create spool directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Open a fresh spool file.
    pub fn create(&self) -> StorageResult<SpoolFile> {
        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(&self.dir)?;
        let (file, path) = named.into_parts();

        Ok(SpoolFile {
            file: fs::File::from_std(file),
            path,
            len: 0,
        })
    }
}

/// A spool file being written.
pub struct SpoolFile {
    file: fs::File,
    path: TempPath,
    len: u64,
}

impl SpoolFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to spool upload: {}", e)))?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the write handle.
    pub async fn finish(mut self) -> StorageResult<SpooledUpload> {
        self.file.flush().await?;
        drop(self.file);

        Ok(SpooledUpload {
            path: self.path,
            len: self.len,
        })
    }
}

/// A completely received upload. The file goes away with this value.
#[derive(Debug)]
pub struct SpooledUpload {
    path: TempPath,
    len: u64,
}

impl SpooledUpload {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> StorageResult<Vec<u8>> {
        Ok(fs::read(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spool_roundtrip_and_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let spool = SpoolDir::new(temp_dir.path().join("spool")).await.unwrap();

        let mut file = spool.create().unwrap();
        file.write_chunk(b"hello ").await.unwrap();
        file.write_chunk(b"world").await.unwrap();
        assert_eq!(file.len(), 11);

        let upload = file.finish().await.unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.starts_with(spool.path()));
        assert_eq!(upload.read().await.unwrap(), b"hello world");

        drop(upload);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_abandoned_spool_file_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let spool = SpoolDir::new(temp_dir.path()).await.unwrap();

        let mut file = spool.create().unwrap();
        file.write_chunk(b"partial").await.unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }
}
