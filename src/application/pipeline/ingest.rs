use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    application::{
        dto::media_dto::MediaDTO,
        error::ApplicationError,
        pipeline::{
            conversion::AutoConversion, interceptor::UploadInterceptor,
            reconciler::PersistenceReconciler,
        },
        repositories::MediaRepository,
        services::RemoteStore,
    },
    domain::models::{
        format::numbered_name,
        media::MediaAsset,
        upload::{Operation, UploadFile},
    },
};

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct CreateMediaRequest {
    pub file: UploadFile,
    pub alt: String,
    pub enable_webp: bool,
}

/// Create-operation lifecycle of the host, with the interception points wired in:
/// interceptor, auto-conversion, reconciler, record insert, object write.
pub struct MediaIngestService {
    interceptor: UploadInterceptor,
    conversion: AutoConversion,
    reconciler: PersistenceReconciler,
    store: Arc<dyn RemoteStore>,
    repository: Arc<dyn MediaRepository>,
}

impl MediaIngestService {
    pub fn new(
        interceptor: UploadInterceptor,
        conversion: AutoConversion,
        store: Arc<dyn RemoteStore>,
        repository: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            interceptor,
            conversion,
            reconciler: PersistenceReconciler::new(),
            store,
            repository,
        }
    }

    pub async fn create_media(
        &self,
        request: CreateMediaRequest,
    ) -> Result<MediaAsset, ApplicationError> {
        if request.alt.trim().is_empty() {
            return Err(ApplicationError::BadRequest("alt text is required".to_string()));
        }
        if request.file.content.is_empty() {
            return Err(ApplicationError::BadRequest("file is empty".to_string()));
        }
        if request.file.filename.trim().is_empty() {
            return Err(ApplicationError::BadRequest("filename is required".to_string()));
        }

        let (file, decision) = self
            .interceptor
            .before_operation(Operation::Create, request.file)
            .await;

        let converted = self.conversion.apply(file, request.enable_webp).await?;
        let file = converted.file;

        let draft = MediaDTO {
            alt: Some(request.alt),
            mime_type: Some(file.mime_type.clone()),
            filesize: Some(file.size),
            enable_webp: Some(converted.converted),
            ..Default::default()
        };
        let mut draft = self.reconciler.before_change(draft, &decision);
        draft.sanitize();

        let content_type = draft
            .mime_type
            .clone()
            .unwrap_or_else(|| file.mime_type.clone());

        // The record claims the name first; the unique filename column settles races.
        let media = self.claim_filename(draft, &file.filename).await?;
        let filename = media.filename.clone().unwrap_or_default();

        if let Err(e) = self.store.put(&filename, file.content, &content_type).await {
            error!("Failed to store object '{}': {}", filename, e);
            if let Err(cleanup) = self.repository.delete_media(media.id).await {
                warn!("Could not remove record {} for '{}': {}", media.id, filename, cleanup);
            }
            return Err(e);
        }

        info!(
            "Stored media {} as '{}' ({}, {} bytes)",
            media.id, filename, media.mime_type, media.filesize
        );
        Ok(media)
    }

    pub async fn get_media(&self, id: uuid::Uuid) -> Result<MediaAsset, ApplicationError> {
        self.repository.get_media(id).await
    }

    /// Inserts `draft` under the first free name among `name`, `name-1`, `name-2`, ...
    /// A name is free when no object exists under it and no record holds it.
    async fn claim_filename(
        &self,
        draft: MediaDTO,
        filename: &str,
    ) -> Result<MediaAsset, ApplicationError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = numbered_name(filename, attempt);
            if self.store.exists(&candidate).await? {
                continue;
            }

            let record = MediaDTO {
                filename: Some(candidate.clone()),
                url: Some(self.store.public_url(&candidate)),
                ..draft.clone()
            };

            match self.repository.create_media(record).await {
                Ok(media) => return Ok(media),
                Err(ApplicationError::Conflict(msg)) => {
                    debug!("Filename '{}' already claimed: {}", candidate, msg);
                }
                Err(e) => {
                    error!("Failed to persist record for '{}': {}", candidate, e);
                    return Err(e);
                }
            }
        }

        Err(ApplicationError::Conflict(format!(
            "no free filename for '{}'",
            filename
        )))
    }
}
