//! Upload policy
//!
//! The allow-sets, the size ceiling and the SVG rule table, bundled into one
//! immutable value built at startup and handed to every pipeline stage.

use picguard_core::ImageKind;

use crate::svg::SvgRules;

/// 10 MiB
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Headroom for multipart boundaries and part headers on top of the file
/// itself when checking the declared request length.
pub const MULTIPART_ENVELOPE_ALLOWANCE: usize = 64 * 1024;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_size: usize,
    envelope_allowance: usize,
    allowed_kinds: Vec<ImageKind>,
    allowed_extensions: Vec<String>,
    jpeg_quality: u8,
    svg_rules: SvgRules,
}

impl UploadPolicy {
    /// The fixed production policy.
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self {
            max_file_size: MAX_FILE_SIZE,
            envelope_allowance: MULTIPART_ENVELOPE_ALLOWANCE,
            allowed_kinds: ImageKind::ALL.to_vec(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            svg_rules: SvgRules::standard()?,
        })
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Restrict the accepted kinds. Extensions of removed kinds are dropped too.
    pub fn with_allowed_kinds(mut self, kinds: &[ImageKind]) -> Self {
        self.allowed_kinds = kinds.to_vec();
        self.allowed_extensions
            .retain(|ext| kind_for_extension(ext).is_some_and(|kind| kinds.contains(&kind)));
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Upper bound for the declared request `Content-Length`.
    pub fn max_request_size(&self) -> usize {
        self.max_file_size.saturating_add(self.envelope_allowance)
    }

    pub fn allowed_kinds(&self) -> &[ImageKind] {
        &self.allowed_kinds
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allowed_mime_types(&self) -> Vec<&'static str> {
        self.allowed_kinds.iter().map(|k| k.mime_type()).collect()
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn svg_rules(&self) -> &SvgRules {
        &self.svg_rules
    }

    pub fn is_allowed_kind(&self, kind: ImageKind) -> bool {
        self.allowed_kinds.contains(&kind)
    }

    /// Extension must already be lower-cased.
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }

    /// Map a MIME type to an allowed kind.
    pub fn allowed_kind_for_mime(&self, mime: &str) -> Option<ImageKind> {
        ImageKind::from_mime(mime).filter(|kind| self.is_allowed_kind(*kind))
    }
}

fn kind_for_extension(extension: &str) -> Option<ImageKind> {
    match extension {
        "jpg" | "jpeg" => Some(ImageKind::Jpeg),
        "png" => Some(ImageKind::Png),
        "gif" => Some(ImageKind::Gif),
        "webp" => Some(ImageKind::Webp),
        "svg" => Some(ImageKind::Svg),
        _ => None,
    }
}
