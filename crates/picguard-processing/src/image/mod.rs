//! Raster image handling
//!
//! Raster uploads are never stored as received: they are decoded and
//! re-encoded so that EXIF, ICC, XMP and text chunks do not survive.

pub mod processor;

pub use processor::{ImageProcessor, MetadataReport};
