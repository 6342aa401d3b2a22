//! Test fixtures: small images with and without hostile payloads.

use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;

pub fn create_test_image(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 8) as u8, (y * 8) as u8, 128])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

pub fn create_test_png() -> Vec<u8> {
    create_test_image(ImageFormat::Png, 16, 16)
}

/// TIFF-structured EXIF block pointing at a GPS IFD.
pub fn exif_with_gps() -> Bytes {
    let mut exif = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
    exif.extend_from_slice(&[0x00, 0x01]);
    exif.extend_from_slice(&[0x88, 0x25, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x1a]);
    exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    exif.extend_from_slice(&[0x00, 0x00]);
    Bytes::from(exif)
}

/// A couple of KB of JPEG carrying an EXIF GPS block.
pub fn create_jpeg_with_exif() -> Vec<u8> {
    let plain = create_test_image(ImageFormat::Jpeg, 32, 32);
    let mut jpeg = Jpeg::from_bytes(plain.into()).unwrap();
    jpeg.set_exif(Some(exif_with_gps()));
    jpeg.encoder().bytes().to_vec()
}

pub fn jpeg_has_exif(data: &[u8]) -> bool {
    Jpeg::from_bytes(Bytes::copy_from_slice(data))
        .unwrap()
        .exif()
        .is_some()
}

pub const CLEAN_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><circle cx="5" cy="5" r="4"/></svg>"#;

pub const SCRIPT_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script><rect width="10" height="10"/></svg>"#;

pub const BASE64_IMAGE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><image xlink:href="data:image/png;base64,iVBORw0KGgoAAAANSUhEUg=="/></svg>"#;

pub const HANDLER_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" onload="alert(1)"><rect width="4" height="4" onclick="steal()"/></svg>"#;
