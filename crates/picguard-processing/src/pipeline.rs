//! Upload pipeline: classify → cross-validate → sanitize.
//!
//! Everything here is synchronous and CPU-bound; async callers run
//! [`UploadPipeline::run`] on a blocking thread. Storage is the caller's
//! concern: the pipeline only produces the artifact.

use std::sync::Arc;

use picguard_core::{AppError, ClassificationResult, SanitizedArtifact};

use crate::classifier::ContentClassifier;
use crate::image::ImageProcessor;
use crate::ingress::UploadRequest;
use crate::policy::UploadPolicy;
use crate::svg::SvgSanitizer;
use crate::validator::MediaValidator;

pub struct UploadPipeline {
    policy: Arc<UploadPolicy>,
    classifier: ContentClassifier,
}

impl UploadPipeline {
    pub fn new(policy: Arc<UploadPolicy>) -> Self {
        Self::with_classifier(policy, ContentClassifier::standard())
    }

    pub fn with_classifier(policy: Arc<UploadPolicy>, classifier: ContentClassifier) -> Self {
        Self { policy, classifier }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Complete workflow for one spooled upload
    pub fn run(&self, request: &UploadRequest) -> Result<SanitizedArtifact, AppError> {
        // 1. Re-check the size against bytes actually received
        MediaValidator::new(&self.policy).validate_file_size(request.actual_length())?;

        // 2. Classify from content
        let classification = self.classify(request)?;

        // 3. Extension must agree with content
        self.cross_validate(request, &classification)?;

        // 4. Sanitize for the detected kind
        let artifact = self.sanitize(request, &classification)?;

        tracing::info!(
            kind = %artifact.kind,
            method = %classification.method,
            input_bytes = request.actual_length(),
            output_bytes = artifact.data.len(),
            "Upload sanitized"
        );

        Ok(artifact)
    }

    pub fn classify(&self, request: &UploadRequest) -> Result<ClassificationResult, AppError> {
        self.classifier
            .classify(&request.data, request.declared_mime.as_deref(), &self.policy)
    }

    pub fn cross_validate(
        &self,
        request: &UploadRequest,
        classification: &ClassificationResult,
    ) -> Result<(), AppError> {
        MediaValidator::new(&self.policy)
            .validate_all(&request.filename, classification)
            .map_err(|e| {
                tracing::debug!(error = %e, filename = %request.filename, "Cross-validation failed");
                AppError::from(e)
            })
    }

    pub fn sanitize(
        &self,
        request: &UploadRequest,
        classification: &ClassificationResult,
    ) -> Result<SanitizedArtifact, AppError> {
        let data = if classification.kind.is_raster() {
            ImageProcessor::new(self.policy.jpeg_quality()).sanitize(&request.data, classification)?
        } else {
            SvgSanitizer::new(self.policy.svg_rules())
                .sanitize_bytes(&request.data)?
                .into_bytes()
        };

        Ok(SanitizedArtifact::new(classification.kind, data))
    }
}
