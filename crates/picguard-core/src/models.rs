//! Domain models for the upload pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image formats accepted by the service.
///
/// This is the whole MIME allow-set: a type that cannot be represented here
/// is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
}

impl ImageKind {
    pub const ALL: [ImageKind; 5] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::Webp,
        ImageKind::Svg,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
            ImageKind::Svg => "image/svg+xml",
        }
    }

    /// Normalized extension used for stored files (without leading dot)
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
            ImageKind::Svg => "svg",
        }
    }

    /// Parse a MIME type, ignoring parameters and case.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime_type().eq_ignore_ascii_case(essence))
    }

    /// Raster formats are re-encoded; SVG goes through the markup sanitizer.
    pub fn is_raster(&self) -> bool {
        !matches!(self, ImageKind::Svg)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// How the classifier reached its verdict, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMethod {
    /// Binary magic-byte signature matched
    Sniffed,
    /// Format-specific content check passed
    ContentHeuristic,
    /// Client-declared type trusted as a last resort
    DeclaredFallback,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::Sniffed => "sniffed",
            ClassificationMethod::ContentHeuristic => "content-heuristic",
            ClassificationMethod::DeclaredFallback => "declared-fallback",
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub kind: ImageKind,
    pub method: ClassificationMethod,
    /// Name of the classifier strategy that produced the verdict
    pub strategy: &'static str,
}

impl ClassificationResult {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn is_fallback(&self) -> bool {
        self.method == ClassificationMethod::DeclaredFallback
    }
}

/// Sanitized content ready to be written once to the upload directory.
#[derive(Debug, Clone)]
pub struct SanitizedArtifact {
    pub kind: ImageKind,
    pub data: Vec<u8>,
}

impl SanitizedArtifact {
    pub fn new(kind: ImageKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn content_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.kind.extension()
    }
}
