use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use color_eyre::eyre::WrapErr as _;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    auth::AdminSession,
    errors::{ApiError, ServerResult, WithApiError as _},
    state::AppState,
    storage::UploadedObject,
};

pub const DEFAULT_FOLDER: &str = "uploads";

/// A file field pulled out of a multipart body
pub(crate) struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl FilePart {
    pub(crate) async fn read(field: axum::extract::multipart::Field<'_>) -> color_eyre::Result<Option<Self>> {
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            });

        let bytes = field.bytes().await.wrap_err("Failed to read uploaded file")?;

        // Browsers send an empty part for a file input left blank
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            file_name,
            content_type,
            bytes,
        }))
    }
}

/// Sends the file to the active storage provider
pub(crate) async fn store(state: &AppState, folder: &str, file: FilePart) -> color_eyre::Result<UploadedObject> {
    let uploaded = state
        .storage
        .upload(folder, &file.file_name, &file.content_type, file.bytes)
        .await
        .wrap_err("Storage provider rejected the upload")?;

    info!(key = %uploaded.key, provider = state.storage.provider_name(), "Stored upload");
    Ok(uploaded)
}

/// `POST /api/upload`: multipart `file` plus an optional `folder`
pub async fn upload(
    State(state): State<AppState>,
    _admin: AdminSession,
    mut multipart: Multipart,
) -> ServerResult<Json<Value>, ApiError> {
    let mut file = None;
    let mut folder = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("Invalid multipart body: {err}")))?
    {
        match field.name() {
            Some("file") => {
                file = FilePart::read(field)
                    .await
                    .with_api_error(StatusCode::BAD_REQUEST, "Invalid multipart body")?;
            }
            Some("folder") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::bad_request(format!("Invalid multipart body: {err}")))?;
                folder = Some(text).filter(|f| !f.trim().is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let folder = folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());

    let uploaded = store(&state, &folder, file)
        .await
        .with_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload file")?;

    Ok(Json(json!({
        "url": uploaded.url,
        "key": uploaded.key,
        "message": "File uploaded successfully",
    })))
}

/// `GET /uploads/*key` for the local and in-memory providers
pub async fn serve_upload(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.storage.get(&key).await {
        Ok(Some(object)) => (
            [
                (header::CONTENT_TYPE, object.content_type),
                (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
            ],
            object.bytes,
        )
            .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(error = ?err, key, "Failed to read stored object");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
