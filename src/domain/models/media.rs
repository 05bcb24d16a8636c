use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored media record. `mime_type` always describes the bytes found at `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
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
