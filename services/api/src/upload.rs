//! Multipart upload parsing with an image size guard

use axum::{
    extract::multipart::{Field, Multipart, MultipartError},
    http::StatusCode,
};
use tracing::{debug, warn};

use crate::{
    error::{ApiError, ApiResult},
    models::content::{ContentFields, DEFAULT_IMAGE_CONTENT_TYPE, ImageUpload},
};

pub use common::limits::MAX_IMAGE_BYTES;

/// Router-wide body limit, above the image limit so the image guard reports
/// oversized files with its own message
pub const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

/// A parsed create/update form
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: ContentFields,
    pub image: Option<ImageUpload>,
}

/// Read the `name`, `description`, `designation` and `image` parts
///
/// Reading stops as soon as the image crosses [`MAX_IMAGE_BYTES`]; the
/// partial buffer is dropped with the error.
pub async fn read_upload_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());
                let bytes = read_limited(&mut field, MAX_IMAGE_BYTES).await?;

                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        bytes,
                        content_type,
                    });
                }
            }
            "name" => form.fields.name = Some(field.text().await.map_err(multipart_error)?),
            "description" => {
                form.fields.description = Some(field.text().await.map_err(multipart_error)?)
            }
            "designation" => {
                form.fields.designation = Some(field.text().await.map_err(multipart_error)?)
            }
            other => debug!("Ignoring unexpected form field: {}", other),
        }
    }

    Ok(form)
}

async fn read_limited(field: &mut Field<'_>, limit: usize) -> ApiResult<Vec<u8>> {
    let mut buffer = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buffer.len() + chunk.len() > limit {
            warn!("Upload exceeded {} bytes, aborting", limit);
            return Err(ApiError::PayloadTooLarge);
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::BadRequest(format!("Invalid form data: {}", err.body_text()))
}
