use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    adapters::{dto::media_dto::MediaResponse, state::AppState},
    application::{error::ApplicationError, pipeline::CreateMediaRequest},
    domain::models::{format::OPAQUE_MIME, upload::UploadFile},
};

fn multipart_error(e: MultipartError) -> ApplicationError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload exceeds the body limit: {}", e);
        ApplicationError::PayloadTooLarge
    } else {
        warn!("Invalid multipart data: {}", e);
        ApplicationError::BadRequest("Invalid request format".to_string())
    }
}

fn parse_flag(value: &str) -> Result<bool, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" | "" => Ok(false),
        other => Err(ApplicationError::BadRequest(format!(
            "Invalid 'enableWebP' value: {}",
            other
        ))),
    }
}

pub struct MediaController;

impl MediaController {
    /// POST /api/v1/media
    /// Multipart fields: `file` (required), `alt` (required), `enableWebP` (optional)
    pub async fn upload_media(
        State(app_state): State<AppState>,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<MediaResponse>), ApplicationError> {
        let mut file: Option<UploadFile> = None;
        let mut alt: Option<String> = None;
        let mut enable_webp = true;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("").to_string();
                    let mime_type = field.content_type().unwrap_or(OPAQUE_MIME).to_string();
                    let content = field.bytes().await.map_err(multipart_error)?.to_vec();
                    file = Some(UploadFile::new(content, filename, mime_type));
                }
                "alt" => {
                    alt = Some(field.text().await.map_err(multipart_error)?);
                }
                "enableWebP" => {
                    enable_webp = parse_flag(&field.text().await.map_err(multipart_error)?)?;
                }
                _ => {}
            }
        }

        let file = file.ok_or_else(|| {
            warn!("Missing required 'file' field in upload");
            ApplicationError::BadRequest("Missing required field 'file'".to_string())
        })?;
        let alt = alt.ok_or_else(|| {
            warn!("Missing required 'alt' field in upload");
            ApplicationError::BadRequest("Missing required field 'alt'".to_string())
        })?;

        info!(
            "Upload received: '{}' ({}, {} bytes)",
            file.filename, file.mime_type, file.size
        );

        let media = app_state
            .ingest_service
            .create_media(CreateMediaRequest {
                file,
                alt,
                enable_webp,
            })
            .await?;

        Ok((StatusCode::CREATED, Json(MediaResponse::from(media))))
    }

    /// GET /api/v1/media/{id}
    pub async fn get_media(
        State(app_state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Json<MediaResponse>, ApplicationError> {
        let id = Uuid::parse_str(&id).map_err(|e| {
            warn!("Invalid UUID provided: {}, error: {}", id, e);
            ApplicationError::BadRequest("Invalid media ID format".to_string())
        })?;

        let media = app_state.ingest_service.get_media(id).await?;
        Ok(Json(MediaResponse::from(media)))
    }
}
