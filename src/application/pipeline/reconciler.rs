use tracing::{debug, info};

use crate::{
    application::dto::media_dto::MediaDTO,
    domain::models::{format::GIF_MIME, upload::UploadDecision},
};

/// `beforeChange` stage: fixes the record about to be written so its MIME type
/// describes the stored bytes, whatever placeholder travelled through the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersistenceReconciler;

impl PersistenceReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn before_change(&self, mut data: MediaDTO, decision: &UploadDecision) -> MediaDTO {
        if !decision.skip_auto_convert {
            return data;
        }

        if decision.original_mime_type != GIF_MIME {
            debug!(
                "Declared type '{}' replaced by '{}'",
                decision.original_mime_type, GIF_MIME
            );
        }

        info!(
            "Restoring MIME type '{}' (was {:?}) and disabling WebP for {:?}",
            GIF_MIME, data.mime_type, data.filename
        );
        data.mime_type = Some(GIF_MIME.to_string());
        data.enable_webp = Some(false);
        data
    }
}
