use picguard_core::{AppError, ClassificationResult};
use std::path::Path;

use crate::policy::UploadPolicy;

/// Rejections raised while checking the file against its name
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Extension {extension} maps to {expected}, content is {detected}")]
    ExtensionContentMismatch {
        extension: String,
        expected: String,
        detected: String,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { max, .. } => crate::ingress::size_limit_error(max),
            ValidationError::EmptyFile => AppError::Transport("Uploaded file is empty".to_string()),
            ValidationError::InvalidExtension { .. } | ValidationError::InvalidFilename(_) => {
                AppError::TypeMismatch("Invalid file extension".to_string())
            }
            ValidationError::ExtensionContentMismatch { .. } => {
                AppError::TypeMismatch("File extension and content do not match".to_string())
            }
        }
    }
}

/// Cross-validator
///
/// Requires agreement between the detected content type, the client file
/// extension and the standard extension-to-MIME mapping before any
/// sanitization work is done.
pub struct MediaValidator<'a> {
    policy: &'a UploadPolicy,
}

impl<'a> MediaValidator<'a> {
    pub fn new(policy: &'a UploadPolicy) -> Self {
        Self { policy }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.policy.max_file_size() {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.policy.max_file_size(),
            });
        }

        Ok(())
    }

    /// Validate file extension, returning it lower-cased
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = file_extension(filename)
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.policy.is_allowed_extension(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.policy.allowed_extensions().to_vec(),
            });
        }

        Ok(extension)
    }

    /// Validate that the extension maps to the detected content type.
    /// An extension the MIME database does not know leaves the classifier
    /// authoritative.
    pub fn validate_extension_content_match(
        &self,
        extension: &str,
        classification: &ClassificationResult,
    ) -> Result<(), ValidationError> {
        let Some(expected) = mime_guess::from_ext(extension).first_raw() else {
            tracing::debug!(
                extension = %extension,
                detected = %classification.kind,
                "Extension has no MIME mapping, using classifier result"
            );
            return Ok(());
        };

        if !expected.eq_ignore_ascii_case(classification.mime_type()) {
            return Err(ValidationError::ExtensionContentMismatch {
                extension: extension.to_string(),
                expected: expected.to_string(),
                detected: classification.mime_type().to_string(),
            });
        }

        Ok(())
    }

    /// Run every cross-check
    pub fn validate_all(
        &self,
        filename: &str,
        classification: &ClassificationResult,
    ) -> Result<(), ValidationError> {
        let extension = self.validate_extension(filename)?;
        self.validate_extension_content_match(&extension, classification)?;
        Ok(())
    }
}

/// Lower-cased final extension of a client filename.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use picguard_core::{ClassificationMethod, ImageKind};

    fn sniffed(kind: ImageKind) -> ClassificationResult {
        ClassificationResult {
            kind,
            method: ClassificationMethod::Sniffed,
            strategy: "magic-bytes",
        }
    }

    #[test]
    fn test_validate_file_size() {
        let policy = UploadPolicy::standard().unwrap().with_max_file_size(1000);
        let validator = MediaValidator::new(&policy);

        assert!(validator.validate_file_size(500).is_ok());
        assert!(validator.validate_file_size(1000).is_ok());
        assert!(matches!(
            validator.validate_file_size(1001),
            Err(ValidationError::FileTooLarge { .. })
        ));
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension() {
        let policy = UploadPolicy::standard().unwrap();
        let validator = MediaValidator::new(&policy);

        assert_eq!(validator.validate_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(validator.validate_extension("a.b.webp").unwrap(), "webp");
        assert!(validator.validate_extension("photo.png.exe").is_err());
        assert!(validator.validate_extension("noext").is_err());
        assert!(validator.validate_extension("photo.").is_err());
        assert!(validator.validate_extension(".svg").is_err());
    }

    #[test]
    fn test_extension_content_match() {
        let policy = UploadPolicy::standard().unwrap();
        let validator = MediaValidator::new(&policy);

        assert!(validator.validate_all("a.jpeg", &sniffed(ImageKind::Jpeg)).is_ok());
        assert!(validator.validate_all("a.jpg", &sniffed(ImageKind::Jpeg)).is_ok());
        assert!(validator.validate_all("a.svg", &sniffed(ImageKind::Svg)).is_ok());
        assert!(validator.validate_all("a.webp", &sniffed(ImageKind::Webp)).is_ok());
    }

    #[test]
    fn test_png_renamed_to_svg_is_rejected() {
        let policy = UploadPolicy::standard().unwrap();
        let validator = MediaValidator::new(&policy);

        let err = validator
            .validate_all("logo.svg", &sniffed(ImageKind::Png))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ExtensionContentMismatch { .. }
        ));

        let app: AppError = err.into();
        assert_eq!(
            app.to_string(),
            "Type mismatch: File extension and content do not match"
        );
    }

    #[test]
    fn test_invalid_extension_maps_to_type_mismatch() {
        let policy = UploadPolicy::standard().unwrap();
        let validator = MediaValidator::new(&policy);

        let app: AppError = validator
            .validate_all("shell.php", &sniffed(ImageKind::Png))
            .unwrap_err()
            .into();
        assert!(matches!(app, AppError::TypeMismatch(ref m) if m == "Invalid file extension"));
    }
}
