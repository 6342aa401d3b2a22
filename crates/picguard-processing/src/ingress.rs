//! Ingress guard
//!
//! Transport preconditions checked before any byte of content is inspected:
//! the request must be `multipart/form-data`, the declared length must fit
//! the ceiling plus the multipart envelope, and the streamed file part is
//! counted against the ceiling as it is spooled.

use picguard_core::AppError;

use crate::policy::UploadPolicy;

/// Multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

/// One upload, as received by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Client filename, used for the extension only
    pub filename: String,
    /// `Content-Type` of the file part
    pub declared_mime: Option<String>,
    /// Request `Content-Length`, if the client sent one
    pub declared_length: Option<u64>,
    /// Bytes actually received
    pub data: Vec<u8>,
}

impl UploadRequest {
    pub fn actual_length(&self) -> usize {
        self.data.len()
    }
}

/// Reject anything that is not `multipart/form-data`.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), AppError> {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if !essence.eq_ignore_ascii_case("multipart/form-data") {
        return Err(AppError::Transport(
            "Content-Type must be multipart/form-data".to_string(),
        ));
    }

    Ok(())
}

/// Advisory check on the declared request length. The real limit is
/// enforced on streamed bytes by [`ByteBudget`].
pub fn check_declared_length(
    declared_length: Option<u64>,
    policy: &UploadPolicy,
) -> Result<(), AppError> {
    match declared_length {
        Some(length) if length > policy.max_request_size() as u64 => {
            Err(size_limit_error(policy.max_file_size()))
        }
        _ => Ok(()),
    }
}

/// Counts bytes of the file part while it is spooled.
#[derive(Debug, Clone, Copy)]
pub struct ByteBudget {
    limit: usize,
    received: usize,
}

impl ByteBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, received: 0 }
    }

    pub fn for_policy(policy: &UploadPolicy) -> Self {
        Self::new(policy.max_file_size())
    }

    /// Account for one chunk; fails as soon as the total passes the limit.
    pub fn consume(&mut self, chunk_len: usize) -> Result<(), AppError> {
        self.received = self.received.saturating_add(chunk_len);
        if self.received > self.limit {
            return Err(size_limit_error(self.limit));
        }
        Ok(())
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Fails if nothing was received.
    pub fn finish(self) -> Result<usize, AppError> {
        if self.received == 0 {
            return Err(AppError::Transport("Uploaded file is empty".to_string()));
        }
        Ok(self.received)
    }
}

pub fn size_limit_error(limit: usize) -> AppError {
    AppError::SizeLimit(format!(
        "File size exceeds the maximum of {}MB",
        limit / (1024 * 1024)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UploadPolicy {
        UploadPolicy::standard().unwrap()
    }

    #[test]
    fn test_content_type_accepts_multipart_with_boundary() {
        assert!(check_content_type(Some("multipart/form-data; boundary=abc")).is_ok());
        assert!(check_content_type(Some("Multipart/Form-Data;boundary=x")).is_ok());
    }

    #[test]
    fn test_content_type_rejects_others() {
        for ct in [
            None,
            Some(""),
            Some("application/json"),
            Some("multipart/mixed; boundary=x"),
            Some("image/png"),
        ] {
            let err = check_content_type(ct).unwrap_err();
            assert!(matches!(err, AppError::Transport(_)), "{ct:?}");
        }
    }

    #[test]
    fn test_declared_length_allows_envelope() {
        let policy = policy();
        let max = policy.max_file_size() as u64;
        assert!(check_declared_length(None, &policy).is_ok());
        assert!(check_declared_length(Some(max + 1024), &policy).is_ok());
        let err = check_declared_length(Some(max + 1024 * 1024), &policy).unwrap_err();
        assert!(matches!(err, AppError::SizeLimit(_)));
    }

    #[test]
    fn test_byte_budget_rejects_past_limit() {
        let mut budget = ByteBudget::new(10);
        budget.consume(6).unwrap();
        budget.consume(4).unwrap();
        assert_eq!(budget.received(), 10);
        let err = budget.consume(1).unwrap_err();
        assert!(matches!(err, AppError::SizeLimit(_)));
    }

    #[test]
    fn test_byte_budget_empty_file() {
        let budget = ByteBudget::for_policy(&policy());
        let err = budget.finish().unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn test_size_limit_message() {
        let err = size_limit_error(MAX);
        assert_eq!(err.to_string(), "File too large: File size exceeds the maximum of 10MB");
    }

    const MAX: usize = crate::policy::MAX_FILE_SIZE;
}
