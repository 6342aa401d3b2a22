//! Content classifier
//!
//! Determines the real type of an upload from its bytes. Strategies run in
//! order, strongest evidence first; the first definitive answer wins. A
//! strategy may also reject outright, which stops the chain.

use picguard_core::{AppError, ClassificationMethod, ClassificationResult, ImageKind};

use crate::policy::UploadPolicy;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// What a strategy has to work with.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub data: &'a [u8],
    /// Client-declared MIME type of the file part
    pub declared_mime: Option<&'a str>,
    pub policy: &'a UploadPolicy,
}

impl ClassifierInput<'_> {
    fn declared_kind(&self) -> Option<ImageKind> {
        self.declared_mime.and_then(ImageKind::from_mime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Definitive(ImageKind),
    NoOpinion,
}

pub trait ClassificationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Evidence strength recorded when this strategy answers.
    fn method(&self) -> ClassificationMethod;

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Verdict, AppError>;
}

/// Binary signature detection.
pub struct MagicBytesStrategy;

impl ClassificationStrategy for MagicBytesStrategy {
    fn name(&self) -> &'static str {
        "magic-bytes"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::Sniffed
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Verdict, AppError> {
        let Some(detected) = infer::get(input.data) else {
            return Ok(Verdict::NoOpinion);
        };

        // XML and HTML matchers fire on SVG text; markup has no signature.
        if detected.matcher_type() == infer::MatcherType::Text {
            return Ok(Verdict::NoOpinion);
        }

        match ImageKind::from_mime(detected.mime_type()) {
            Some(kind) => Ok(Verdict::Definitive(kind)),
            None => {
                tracing::debug!(detected = %detected.mime_type(), "Sniffed type is not an accepted image");
                Err(not_an_image())
            }
        }
    }
}

/// Root tag check for SVG, applied only when the client declared SVG.
pub struct SvgMarkupStrategy;

impl ClassificationStrategy for SvgMarkupStrategy {
    fn name(&self) -> &'static str {
        "svg-markup"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::ContentHeuristic
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Verdict, AppError> {
        if input.declared_kind() != Some(ImageKind::Svg) {
            return Ok(Verdict::NoOpinion);
        }

        let text = String::from_utf8_lossy(input.data);
        if text.contains("<svg") && text.contains("</svg>") {
            Ok(Verdict::Definitive(ImageKind::Svg))
        } else {
            Err(AppError::Classification("Invalid SVG file".to_string()))
        }
    }
}

/// Full 8-byte PNG signature, applied only when the client declared PNG.
pub struct PngSignatureStrategy;

impl ClassificationStrategy for PngSignatureStrategy {
    fn name(&self) -> &'static str {
        "png-signature"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::ContentHeuristic
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Verdict, AppError> {
        if input.declared_kind() != Some(ImageKind::Png) {
            return Ok(Verdict::NoOpinion);
        }

        if input.data.len() >= PNG_SIGNATURE.len()
            && input.data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
        {
            Ok(Verdict::Definitive(ImageKind::Png))
        } else {
            Err(AppError::Classification("Invalid PNG file".to_string()))
        }
    }
}

/// Last resort: trust the declared type if it is on the allow-set.
pub struct DeclaredTypeStrategy;

impl ClassificationStrategy for DeclaredTypeStrategy {
    fn name(&self) -> &'static str {
        "declared-type"
    }

    fn method(&self) -> ClassificationMethod {
        ClassificationMethod::DeclaredFallback
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Verdict, AppError> {
        Ok(input
            .declared_mime
            .and_then(|mime| input.policy.allowed_kind_for_mime(mime))
            .map_or(Verdict::NoOpinion, Verdict::Definitive))
    }
}

/// Ordered strategy chain.
pub struct ContentClassifier {
    strategies: Vec<Box<dyn ClassificationStrategy>>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl ContentClassifier {
    pub fn standard() -> Self {
        Self::with_strategies(vec![
            Box::new(MagicBytesStrategy),
            Box::new(SvgMarkupStrategy),
            Box::new(PngSignatureStrategy),
            Box::new(DeclaredTypeStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ClassificationStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn classify(
        &self,
        data: &[u8],
        declared_mime: Option<&str>,
        policy: &UploadPolicy,
    ) -> Result<ClassificationResult, AppError> {
        let input = ClassifierInput {
            data,
            declared_mime,
            policy,
        };

        for strategy in &self.strategies {
            match strategy.classify(&input)? {
                Verdict::Definitive(kind) => {
                    if !policy.is_allowed_kind(kind) {
                        return Err(not_an_image());
                    }

                    tracing::debug!(
                        strategy = strategy.name(),
                        kind = %kind,
                        method = %strategy.method(),
                        "Upload classified"
                    );

                    return Ok(ClassificationResult {
                        kind,
                        method: strategy.method(),
                        strategy: strategy.name(),
                    });
                }
                Verdict::NoOpinion => continue,
            }
        }

        Err(AppError::Classification(
            "Could not determine file type".to_string(),
        ))
    }
}

fn not_an_image() -> AppError {
    AppError::Classification("Invalid file type. Only image files are accepted".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn policy() -> UploadPolicy {
        UploadPolicy::standard().unwrap()
    }

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn classify(data: &[u8], declared: Option<&str>) -> Result<ClassificationResult, AppError> {
        ContentClassifier::standard().classify(data, declared, &policy())
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            ContentClassifier::standard().strategy_names(),
            vec!["magic-bytes", "svg-markup", "png-signature", "declared-type"]
        );
    }

    #[test]
    fn test_sniffed_formats_ignore_declared_type() {
        for (format, kind) in [
            (ImageFormat::Png, ImageKind::Png),
            (ImageFormat::Jpeg, ImageKind::Jpeg),
        ] {
            let result = classify(&encode(format), Some("image/svg+xml")).unwrap();
            assert_eq!(result.kind, kind);
            assert_eq!(result.method, ClassificationMethod::Sniffed);
            assert_eq!(result.strategy, "magic-bytes");
        }
    }

    #[test]
    fn test_svg_with_xml_prolog_is_content_heuristic() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let result = classify(svg, Some("image/svg+xml")).unwrap();
        assert_eq!(result.kind, ImageKind::Svg);
        assert_eq!(result.method, ClassificationMethod::ContentHeuristic);
    }

    #[test]
    fn test_svg_without_closing_tag_is_rejected() {
        let err = classify(b"<svg><rect/>", Some("image/svg+xml")).unwrap_err();
        assert!(matches!(err, AppError::Classification(ref m) if m == "Invalid SVG file"));
    }

    #[test]
    fn test_png_signature_mismatch_is_hard_rejection() {
        let mut data = encode(ImageFormat::Png);
        data[3] = b'X';
        let err = classify(&data, Some("image/png")).unwrap_err();
        assert!(matches!(err, AppError::Classification(ref m) if m == "Invalid PNG file"));
    }

    #[test]
    fn test_png_signature_short_buffer() {
        let err = classify(&[0x89, 0x50, 0x4E], Some("image/png")).unwrap_err();
        assert!(matches!(err, AppError::Classification(ref m) if m == "Invalid PNG file"));
    }

    #[test]
    fn test_declared_fallback_is_last_resort() {
        let result = classify(b"not really a gif", Some("image/gif")).unwrap();
        assert_eq!(result.kind, ImageKind::Gif);
        assert!(result.is_fallback());
        assert_eq!(result.strategy, "declared-type");
    }

    #[test]
    fn test_nothing_answers() {
        let err = classify(b"plain text", Some("text/plain")).unwrap_err();
        assert!(matches!(err, AppError::Classification(ref m) if m == "Could not determine file type"));

        let err = classify(b"plain text", None).unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
    }

    #[test]
    fn test_sniffed_non_image_is_rejected() {
        let pdf = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj\n";
        let err = classify(pdf, Some("image/png")).unwrap_err();
        assert!(matches!(
            err,
            AppError::Classification(ref m) if m == "Invalid file type. Only image files are accepted"
        ));
    }

    #[test]
    fn test_sniffed_kind_outside_policy_is_rejected() {
        let policy = policy().with_allowed_kinds(&[ImageKind::Jpeg]);
        let err = ContentClassifier::standard()
            .classify(&encode(ImageFormat::Png), Some("image/png"), &policy)
            .unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
    }

    struct Never;

    impl ClassificationStrategy for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn method(&self) -> ClassificationMethod {
            ClassificationMethod::Sniffed
        }

        fn classify(&self, _input: &ClassifierInput<'_>) -> Result<Verdict, AppError> {
            Ok(Verdict::NoOpinion)
        }
    }

    #[test]
    fn test_custom_chain_fails_closed() {
        let classifier = ContentClassifier::with_strategies(vec![Box::new(Never)]);
        let err = classifier
            .classify(&encode(ImageFormat::Png), Some("image/png"), &policy())
            .unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
    }
}
