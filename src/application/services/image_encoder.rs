use std::path::Path;

use async_trait::async_trait;

use crate::application::error::ApplicationError;

/// Re-encodes a raster image into the target lossy format.
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// MIME type of everything this encoder produces.
    fn target_mime_type(&self) -> &'static str;

    /// Extension (without dot) matching `target_mime_type`.
    fn target_extension(&self) -> &'static str;

    async fn encode_file(&self, input: &Path, output: &Path) -> Result<(), ApplicationError>;
}
