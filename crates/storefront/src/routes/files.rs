//! File upload and download.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use bookstore_core::Action;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Multipart field holding the upload.
const FILE_FIELD: &str = "file";

/// Response of `POST /upload`.
#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub message: &'static str,
    pub filename: String,
}

/// Store the multipart `file` field under its client-supplied name.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Uploaded>), AppError> {
    user.identity().authorize(Action::UploadFiles)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        if filename.is_empty() {
            return Err(AppError::BadRequest("No selected file".to_owned()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        state.files().save(&filename, &bytes).await?;

        return Ok((
            StatusCode::CREATED,
            Json(Uploaded {
                message: "File uploaded successfully",
                filename,
            }),
        ));
    }

    Err(AppError::BadRequest("No file part".to_owned()))
}

/// Serve a stored file as an attachment.
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.files().open(&filename).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
