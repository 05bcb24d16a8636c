use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::media::MediaAsset;

/// Partial media record: `None` means "leave unchanged" on update.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MediaDTO {
    pub id: Option<Uuid>,
    pub alt: Option<String>,
    pub filename: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub filesize: Option<u64>,
    pub url: Option<String>,
    #[serde(rename = "enableWebP")]
    pub enable_webp: Option<bool>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MediaDTO {
    pub fn for_update(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn sanitize(&mut self) {
        if let Some(ref mut alt) = self.alt {
            *alt = alt.trim().to_string();
        }
        if let Some(ref mut filename) = self.filename {
            *filename = filename.trim().to_string();
        }
        if let Some(ref mut mime_type) = self.mime_type {
            *mime_type = mime_type.trim().to_ascii_lowercase();
        }
        if let Some(filesize) = self.filesize {
            self.filesize = Some(std::cmp::min(filesize, i64::MAX as u64));
        }
    }

    /// True when no column would be written by an update.
    pub fn has_no_changes(&self) -> bool {
        self.alt.is_none()
            && self.filename.is_none()
            && self.mime_type.is_none()
            && self.filesize.is_none()
            && self.url.is_none()
            && self.enable_webp.is_none()
    }
}

impl From<MediaAsset> for MediaDTO {
    fn from(value: MediaAsset) -> Self {
        MediaDTO {
            id: Some(value.id),
            alt: Some(value.alt),
            filename: value.filename,
            mime_type: Some(value.mime_type),
            filesize: Some(value.filesize),
            url: Some(value.url),
            enable_webp: Some(value.enable_webp),
            created_at: Some(value.created_at),
            updated_at: Some(value.updated_at),
        }
    }
}

impl From<MediaDTO> for MediaAsset {
    fn from(value: MediaDTO) -> Self {
        let now = Utc::now();
        MediaAsset {
            id: value.id.unwrap_or_else(Uuid::new_v4),
            alt: value.alt.unwrap_or_default(),
            filename: value.filename,
            mime_type: value.mime_type.unwrap_or_default(),
            filesize: value.filesize.unwrap_or(0),
            url: value.url.unwrap_or_default(),
            enable_webp: value.enable_webp.unwrap_or(false),
            created_at: value.created_at.unwrap_or(now),
            updated_at: value.updated_at.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_normalizes_text_and_clamps_size() {
        let mut dto = MediaDTO {
            alt: Some("  A cat  ".to_string()),
            mime_type: Some(" Image/GIF ".to_string()),
            filesize: Some(u64::MAX),
            ..Default::default()
        };
        dto.sanitize();

        assert_eq!(dto.alt.as_deref(), Some("A cat"));
        assert_eq!(dto.mime_type.as_deref(), Some("image/gif"));
        assert_eq!(dto.filesize, Some(i64::MAX as u64));
    }

    #[test]
    fn update_with_only_id_has_no_changes() {
        let dto = MediaDTO::for_update(Uuid::new_v4());
        assert!(dto.has_no_changes());
    }
}
