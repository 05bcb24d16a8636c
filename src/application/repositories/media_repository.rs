use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::{dto::media_dto::MediaDTO, error::ApplicationError},
    domain::models::media::MediaAsset,
};

/// `create_media` and `update_media` fail with `ApplicationError::Conflict` when the
/// filename is already held by another record.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError>;
    async fn get_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError>;
    /// One page ordered by creation time, oldest first.
    async fn list_media(&self, limit: u32, offset: u32)
        -> Result<Vec<MediaAsset>, ApplicationError>;
    /// Writes every provided field of `media` in a single row update.
    async fn update_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError>;
    async fn delete_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError>;
}
