//! PicGuard processing library
//!
//! The upload validation and sanitization pipeline: ingress checks,
//! content classification, cross-validation against the filename, and the
//! raster and SVG sanitizers. All stages take an explicit [`UploadPolicy`].

pub mod classifier;
pub mod image;
pub mod ingress;
pub mod pipeline;
pub mod policy;
pub mod svg;
pub mod validator;

pub use classifier::{ClassificationStrategy, ClassifierInput, ContentClassifier, Verdict};
pub use crate::image::{ImageProcessor, MetadataReport};
pub use ingress::{ByteBudget, UploadRequest, IMAGE_FIELD};
pub use pipeline::UploadPipeline;
pub use policy::{UploadPolicy, MAX_FILE_SIZE};
pub use svg::{SvgRules, SvgSanitizer};
pub use validator::{MediaValidator, ValidationError};
