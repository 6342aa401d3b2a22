//! Picguard Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the upload pipeline, the storage layer and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadDirsConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ClassificationMethod, ClassificationResult, ImageKind, SanitizedArtifact};
