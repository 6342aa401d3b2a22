//! Multipart extraction for the upload handler

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use picguard_core::AppError;
use picguard_processing::{ingress, ByteBudget, UploadPolicy, IMAGE_FIELD};
use picguard_storage::{SpoolDir, SpooledUpload};

/// The `image` part, fully spooled to disk.
#[derive(Debug)]
pub struct ReceivedImage {
    pub filename: String,
    pub declared_mime: Option<String>,
    pub spooled: SpooledUpload,
}

/// Body read failures: an exceeded body limit is a size error, anything
/// else is a malformed envelope.
fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ingress::size_limit_error(policy.max_file_size())
    } else {
        AppError::Transport(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

/// Extract the single `image` part from the form.
///
/// The part is streamed into a spool file while its bytes are counted
/// against the ceiling. Other fields are skipped. A second `image` part, a
/// missing one, or an empty one is rejected.
pub async fn extract_image_part(
    mut multipart: Multipart,
    spool: &SpoolDir,
    policy: &UploadPolicy,
) -> Result<ReceivedImage, AppError> {
    let mut received: Option<ReceivedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        if received.is_some() {
            return Err(AppError::Transport(format!(
                "Multiple '{}' fields are not allowed; send exactly one",
                IMAGE_FIELD
            )));
        }

        received = Some(spool_field(field, spool, policy).await?);
    }

    received.ok_or_else(|| AppError::Transport("No file uploaded".to_string()))
}

async fn spool_field(
    mut field: Field<'_>,
    spool: &SpoolDir,
    policy: &UploadPolicy,
) -> Result<ReceivedImage, AppError> {
    let filename = field.file_name().map(str::to_string).unwrap_or_default();
    let declared_mime = field.content_type().map(str::to_string);

    let mut budget = ByteBudget::for_policy(policy);
    let mut file = spool.create()?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        budget.consume(chunk.len())?;
        file.write_chunk(&chunk).await?;
    }

    let size = budget.finish()?;
    let spooled = file.finish().await?;

    tracing::debug!(
        filename = %filename,
        declared_mime = ?declared_mime,
        size_bytes = size,
        "Image part spooled"
    );

    Ok(ReceivedImage {
        filename,
        declared_mime,
        spooled,
    })
}
