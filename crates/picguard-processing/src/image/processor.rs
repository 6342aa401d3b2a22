//! Raster sanitizer - decode and re-encode without auxiliary blocks

use bytes::Bytes;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use img_parts::{DynImage, ImageEXIF, ImageICC};
use picguard_core::{AppError, ClassificationResult, ImageKind};
use std::io::Cursor;

/// Markers identifying an XMP packet in any container.
const XMP_MARKERS: &[&[u8]] = &[b"http://ns.adobe.com/xap/1.0/", b"<x:xmpmeta"];

/// Which auxiliary blocks were present in an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub exif: bool,
    pub icc: bool,
    pub xmp: bool,
}

impl MetadataReport {
    pub fn is_empty(&self) -> bool {
        !(self.exif || self.icc || self.xmp)
    }
}

pub struct ImageProcessor {
    jpeg_quality: u8,
}

impl ImageProcessor {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    /// Inspect metadata blocks. Containers img-parts cannot read (GIF)
    /// report EXIF/ICC as absent.
    pub fn inspect_metadata(data: &[u8]) -> MetadataReport {
        let (exif, icc) = match DynImage::from_bytes(Bytes::copy_from_slice(data)) {
            Ok(Some(img)) => (img.exif().is_some(), img.icc_profile().is_some()),
            _ => (false, false),
        };

        let xmp = XMP_MARKERS
            .iter()
            .any(|marker| data.windows(marker.len()).any(|w| w == *marker));

        MetadataReport { exif, icc, xmp }
    }

    /// Re-encode the image as the classified kind.
    ///
    /// Decoding is pinned to the classified format. A decode failure is a
    /// processing error, except for kinds only trusted from the declared
    /// type: there it means the classification was wrong.
    pub fn sanitize(
        &self,
        data: &[u8],
        classification: &ClassificationResult,
    ) -> Result<Vec<u8>, AppError> {
        let report = Self::inspect_metadata(data);
        if !report.is_empty() {
            tracing::debug!(
                exif = report.exif,
                icc = report.icc,
                xmp = report.xmp,
                "Dropping metadata blocks"
            );
        }

        let result = match classification.kind {
            ImageKind::Gif => self.reencode_gif(data),
            ImageKind::Jpeg => self.reencode_still(data, ImageFormat::Jpeg),
            ImageKind::Png => self.reencode_still(data, ImageFormat::Png),
            ImageKind::Webp => self.reencode_still(data, ImageFormat::WebP),
            ImageKind::Svg => {
                return Err(AppError::Processing(
                    "SVG content routed to the raster sanitizer".to_string(),
                ))
            }
        };

        result.map_err(|e| match e {
            RasterError::Decode(msg) if classification.is_fallback() => {
                tracing::debug!(error = %msg, kind = %classification.kind, "Declared type did not decode");
                AppError::Classification("Could not determine file type".to_string())
            }
            RasterError::Decode(msg) | RasterError::Encode(msg) => AppError::Processing(msg),
        })
    }

    fn reencode_still(&self, data: &[u8], format: ImageFormat) -> Result<Vec<u8>, RasterError> {
        let img = ImageReader::with_format(Cursor::new(data), format)
            .decode()
            .map_err(|e| RasterError::Decode(format!("Failed to decode {:?}: {}", format, e)))?;

        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let encoded = match format {
            ImageFormat::Jpeg => {
                let img = match img {
                    DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
                    other => DynamicImage::ImageRgb8(other.to_rgb8()),
                };
                img.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut cursor,
                    self.jpeg_quality,
                ))
            }
            ImageFormat::WebP => {
                let img = match img {
                    DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
                    other => DynamicImage::ImageRgba8(other.to_rgba8()),
                };
                img.write_with_encoder(WebPEncoder::new_lossless(&mut cursor))
            }
            _ => img.write_to(&mut cursor, format),
        };
        encoded.map_err(|e| RasterError::Encode(format!("Failed to encode {:?}: {}", format, e)))?;

        Ok(buffer)
    }

    /// Every frame is kept with its delay; the output loops forever.
    fn reencode_gif(&self, data: &[u8]) -> Result<Vec<u8>, RasterError> {
        let frames = GifDecoder::new(Cursor::new(data))
            .and_then(|decoder| decoder.into_frames().collect_frames())
            .map_err(|e| RasterError::Decode(format!("Failed to decode Gif: {}", e)))?;

        if frames.is_empty() {
            return Err(RasterError::Decode("GIF has no frames".to_string()));
        }

        let mut buffer = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder
                .set_repeat(Repeat::Infinite)
                .and_then(|_| encoder.encode_frames(frames))
                .map_err(|e| RasterError::Encode(format!("Failed to encode Gif: {}", e)))?;
        }

        Ok(buffer)
    }
}

enum RasterError {
    Decode(String),
    Encode(String),
}
