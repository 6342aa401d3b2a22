use picguard_core::AppError;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(_) => {
                AppError::StructuralViolation("Invalid file path".to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picguard_core::ErrorMetadata;

    #[test]
    fn test_invalid_path_is_structural_violation() {
        let err: AppError = StorageError::InvalidPath("../x".to_string()).into();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Invalid file path");
    }

    #[test]
    fn test_io_failures_are_internal_and_hidden() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/srv/uploads");
        let err: AppError = StorageError::from(io).into();
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.client_message().contains("/srv"));
    }
}
