//! PicGuard Storage Library
//!
//! Local filesystem storage for uploads. Two directories are involved:
//!
//! - **Spool**: request bodies are streamed here first. Spool files are
//!   deleted when dropped, whatever the outcome of the request.
//! - **Uploads**: sanitized artifacts only, written atomically under a
//!   server-generated name `<uuid>.<ext>` and never overwritten.

pub mod error;
pub mod local;
pub mod spool;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use local::{StoredFile, UploadStore};
pub use spool::{SpoolDir, SpoolFile, SpooledUpload};
