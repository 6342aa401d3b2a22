use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::image_upload::UploadResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Picguard API",
        description = "Image upload service that verifies content against the declared type and stores only sanitized files",
    ),
    paths(
        crate::handlers::image_upload::upload_image,
        crate::setup::routes::health::liveness_check,
    ),
    components(schemas(UploadResponse, ErrorResponse)),
    tags(
        (name = "uploads", description = "Image upload"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
