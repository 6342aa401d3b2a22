use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use picguard_core::AppError;
use picguard_processing::{ingress, UploadRequest};
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::UPLOAD_SUCCESS_MESSAGE;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_image_part;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    /// Public path of the stored file, e.g. `/uploads/<uuid>.png`
    pub file_path: String,
}

/// Upload image handler
///
/// Ingress checks run on the headers before the body is read; the `image`
/// part is then spooled, classified, cross-validated and sanitized. Only a
/// fully sanitized artifact reaches the upload directory.
///
/// # Errors
/// - `AppError::Transport` - not multipart, missing or duplicate `image` part, empty file
/// - `AppError::SizeLimit` - declared or streamed size over the ceiling
/// - `AppError::Classification` / `AppError::TypeMismatch` - content does not match the claim
/// - `AppError::StructuralViolation` - SVG with smuggled or active content
/// - `AppError::Processing` - decoder or encoder failure
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded successfully", body = UploadResponse),
        (status = 400, description = "Upload rejected", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let policy = state.policy();

    ingress::check_content_type(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    )?;

    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    ingress::check_declared_length(declared_length, policy)?;

    let multipart = multipart.map_err(|rejection| {
        AppError::Transport(format!("Invalid multipart request: {}", rejection.body_text()))
    })?;

    let received = extract_image_part(multipart, &state.spool, policy).await?;

    let request = UploadRequest {
        filename: received.filename,
        declared_mime: received.declared_mime,
        declared_length,
        data: received.spooled.read().await?,
    };

    let pipeline = state.pipeline.clone();
    let artifact = tokio::task::spawn_blocking(move || pipeline.run(&request))
        .await
        .map_err(|e| AppError::Internal(format!("Sanitizer task failed: {}", e)))??;

    let stored = state.store.persist(artifact).await?;

    // The spool file goes away with `received.spooled` at the end of scope.
    tracing::info!(
        filename = %stored.filename,
        size_bytes = stored.size_bytes,
        "Image uploaded"
    );

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        file_path: stored.public_path,
    }))
}
