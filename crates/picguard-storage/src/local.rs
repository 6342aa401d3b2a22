use std::io::Write;
use std::path::{Component, Path, PathBuf};

use picguard_core::{ImageKind, SanitizedArtifact};
use tempfile::Builder;
use tokio::fs;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// A persisted upload
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    /// Web path the file is served under, e.g. `/uploads/<filename>`
    pub public_path: String,
    pub size_bytes: usize,
}

/// Local filesystem store for sanitized uploads
#[derive(Clone, Debug)]
pub struct UploadStore {
    base_path: PathBuf,
    staging_path: PathBuf,
    public_prefix: String,
}

impl UploadStore {
    /// Create a new UploadStore instance
    ///
    /// # Arguments
    /// * `base_path` - Upload directory, created if missing (e.g., "./uploads")
    /// * `public_prefix` - URL prefix the directory is served under (e.g., "/uploads")
    ///
    /// Writes are staged in a hidden sibling of the upload directory
    /// (`.uploads.staging` next to `uploads`), so partial files are never
    /// served and the final rename stays on one filesystem.
    pub async fn new(base_path: impl Into<PathBuf>, public_prefix: &str) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = staging_dir_for(&base_path)?;

        for dir in [&base_path, &staging_path] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create upload directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(UploadStore {
            base_path,
            staging_path,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// `<uuid-v4>.<ext>`; the extension comes from the validated kind only.
    pub fn generate_filename(kind: ImageKind) -> String {
        format!("{}.{}", Uuid::new_v4(), kind.extension())
    }

    pub fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    /// Convert a filename to its destination path with containment validation.
    ///
    /// Purely lexical: the joined path is normalized without touching the
    /// filesystem and must land strictly inside the upload directory.
    pub fn resolve_path(&self, filename: &str) -> StorageResult<PathBuf> {
        let mut components = Path::new(filename).components();
        let single_component = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_component {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }

        let base = normalize_lexically(&self.base_path);
        let path = normalize_lexically(&self.base_path.join(filename));

        if path == base || !path.starts_with(&base) {
            return Err(StorageError::InvalidPath(filename.to_string()));
        }

        Ok(path)
    }

    /// Write an artifact under a fresh name.
    ///
    /// Content goes to a temporary file in the staging directory, is synced,
    /// then linked into the upload directory without replacing anything. A
    /// failure at any point leaves no file under the final name.
    pub async fn persist(&self, artifact: SanitizedArtifact) -> StorageResult<StoredFile> {
        let filename = Self::generate_filename(artifact.kind);
        let path = self.resolve_path(&filename)?;
        let size_bytes = artifact.data.len();
        let dir = self.staging_path.clone();
        let target = path.clone();

        let start = std::time::Instant::now();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &artifact.data))
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Write task failed: {}", e)))??;

        tracing::info!(
            path = %path.display(),
            filename = %filename,
            size_bytes = size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredFile {
            public_path: self.public_path(&filename),
            filename,
            path,
            size_bytes,
        })
    }
}

/// `<parent>/.<name>.staging` for an upload directory `<parent>/<name>`.
fn staging_dir_for(base_path: &Path) -> StorageResult<PathBuf> {
    let name = base_path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            StorageError::ConfigError(format!(
                "Upload directory {} must have a final path component",
                base_path.display()
            ))
        })?;
    let parent = base_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!(".{}.staging", name)))
}

fn write_atomically(staging: &Path, target: &Path, data: &[u8]) -> StorageResult<()> {
    let mut tmp = Builder::new()
        .prefix(".upload-")
        .tempfile_in(staging)
        .map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create temporary file: {}", e))
        })?;

    // Temp files start out 0600; the served file must be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to set file permissions: {}", e))
            })?;
    }

    tmp.write_all(data)
        .map_err(|e| StorageError::UploadFailed(format!("Failed to write file: {}", e)))?;

    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::UploadFailed(format!("Failed to sync file: {}", e)))?;

    tmp.persist_noclobber(target).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            StorageError::AlreadyExists(target.display().to_string())
        } else {
            StorageError::UploadFailed(format!("Failed to persist file: {}", e.error))
        }
    })?;

    Ok(())
}

/// Resolve `.` and `..` components without filesystem access.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(normalized.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
