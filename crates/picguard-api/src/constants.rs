//! Route paths

pub const UPLOAD_ROUTE: &str = "/upload";
pub const HEALTH_ROUTE: &str = "/health";
pub const OPENAPI_ROUTE: &str = "/api/openapi.json";

/// Success message returned with every accepted upload
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";
