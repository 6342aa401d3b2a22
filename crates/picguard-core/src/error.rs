//! Error types module
//!
//! All pipeline failures are unified under the `AppError` enum. Each variant
//! maps to one rejection class of the upload pipeline and describes its own
//! HTTP presentation through [`ErrorMetadata`].

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected uploads worth noticing (smuggled content)
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "TYPE_MISMATCH")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad request envelope: not multipart, no `image` part, unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("File too large: {0}")]
    SizeLimit(String),

    /// Content type could not be established or is outside the allow-set
    #[error("Classification error: {0}")]
    Classification(String),

    /// Extension, extension mapping and detected content disagree
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Smuggled payloads, missing root tags, script blocks, unsafe paths
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    /// Codec or parser failure while sanitizing
    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Transport(_) => (
            400,
            "TRANSPORT_ERROR",
            false,
            Some("Send a multipart/form-data request with one file in the 'image' field"),
            false,
            LogLevel::Debug,
        ),
        AppError::SizeLimit(_) => (
            400,
            "SIZE_LIMIT_EXCEEDED",
            false,
            Some("Reduce the file size below 10MB"),
            false,
            LogLevel::Debug,
        ),
        AppError::Classification(_) => (
            400,
            "CLASSIFICATION_ERROR",
            false,
            Some("Upload a JPEG, PNG, GIF, WebP or SVG image"),
            false,
            LogLevel::Debug,
        ),
        AppError::TypeMismatch(_) => (
            400,
            "TYPE_MISMATCH",
            false,
            Some("Make sure the file extension matches the image format"),
            false,
            LogLevel::Debug,
        ),
        AppError::StructuralViolation(_) => (
            400,
            "STRUCTURAL_VIOLATION",
            false,
            Some("Remove scripts and embedded data from the image"),
            false,
            LogLevel::Warn,
        ),
        AppError::Processing(_) => (
            500,
            "PROCESSING_ERROR",
            false,
            Some("Check image format and try a different file"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Transport(_) => "TransportError",
            AppError::SizeLimit(_) => "SizeLimitError",
            AppError::Classification(_) => "ClassificationError",
            AppError::TypeMismatch(_) => "TypeMismatchError",
            AppError::StructuralViolation(_) => "StructuralViolationError",
            AppError::Processing(_) => "ProcessingError",
            AppError::Internal(_) => "UnexpectedError",
            AppError::InternalWithSource { .. } => "UnexpectedError",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Transport(ref msg) => msg.clone(),
            AppError::SizeLimit(ref msg) => msg.clone(),
            AppError::Classification(ref msg) => msg.clone(),
            AppError::TypeMismatch(ref msg) => msg.clone(),
            AppError::StructuralViolation(ref msg) => msg.clone(),
            AppError::Processing(_) => "An error occurred while processing the image".to_string(),
            AppError::Internal(_) => "An error occurred while uploading the file".to_string(),
            AppError::InternalWithSource { .. } => {
                "An error occurred while uploading the file".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejections_are_bad_requests() {
        let errors = [
            AppError::Transport("no file".to_string()),
            AppError::SizeLimit("too big".to_string()),
            AppError::Classification("unknown".to_string()),
            AppError::TypeMismatch("mismatch".to_string()),
            AppError::StructuralViolation("script".to_string()),
        ];
        for err in errors {
            assert_eq!(err.http_status_code(), 400, "{}", err.error_type());
            assert!(!err.is_sensitive());
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn test_error_metadata_processing_hides_details() {
        let err = AppError::Processing("jpeg decoder: /tmp/x corrupt".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "PROCESSING_ERROR");
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("/tmp"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_structural_violation() {
        let err = AppError::StructuralViolation("Invalid SVG structure".to_string());
        assert_eq!(err.error_code(), "STRUCTURAL_VIOLATION");
        assert_eq!(err.client_message(), "Invalid SVG structure");
        assert_eq!(err.error_type(), "StructuralViolationError");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_internal_with_source_chain() {
        let source = anyhow::anyhow!("disk full");
        let err = AppError::from(source);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_type(), "UnexpectedError");
        assert!(err.detailed_message().contains("disk full"));
    }

    #[test]
    fn test_io_error_is_internal() {
        let err = AppError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(
            err.client_message(),
            "An error occurred while uploading the file"
        );
    }
}
