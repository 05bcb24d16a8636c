use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::{application::dto::media_dto::MediaDTO, domain::models::media::MediaAsset};

impl FromRow<'_, PgRow> for MediaDTO {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let filesize: i64 = row.try_get("filesize")?;

        Ok(MediaDTO {
            id: Some(row.try_get("id")?),
            alt: Some(row.try_get("alt")?),
            filename: row.try_get("filename")?,
            mime_type: Some(row.try_get("mime_type")?),
            filesize: Some(filesize.max(0) as u64),
            url: Some(row.try_get("url")?),
            enable_webp: Some(row.try_get("enable_webp")?),
            created_at: Some(row.try_get("created_at")?),
            updated_at: Some(row.try_get("updated_at")?),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: Uuid,
    pub alt: String,
    pub filename: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub filesize: u64,
    pub url: String,
    #[serde(rename = "enableWebP")]
    pub enable_webp: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<MediaAsset> for MediaResponse {
    fn from(media: MediaAsset) -> Self {
        Self {
            id: media.id,
            alt: media.alt,
            filename: media.filename,
            mime_type: media.mime_type,
            filesize: media.filesize,
            url: media.url,
            enable_webp: media.enable_webp,
            created_at: media.created_at,
            updated_at: media.updated_at,
        }
    }
}
