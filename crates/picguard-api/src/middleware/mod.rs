pub mod security_headers;

pub use security_headers::{
    security_headers_middleware, serve_upload_dir, SecurityHeadersConfig, UploadDirService,
};
