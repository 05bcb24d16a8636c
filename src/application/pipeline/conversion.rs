use std::{path::PathBuf, sync::Arc};

use tracing::{debug, info};

use crate::{
    application::{error::ApplicationError, services::ImageEncoder},
    domain::models::{format::replace_extension, upload::UploadFile},
};

/// Declared types the host re-encodes on its own.
const CONVERTIBLE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/tiff",
    "image/bmp",
];

#[derive(Debug, Clone)]
pub struct ConvertedUpload {
    pub file: UploadFile,
    pub converted: bool,
}

/// The host's automatic image conversion. It only looks at the declared MIME
/// type, which is why the interceptor has to disguise animated uploads.
pub struct AutoConversion {
    encoder: Arc<dyn ImageEncoder>,
    temp_root: PathBuf,
}

impl AutoConversion {
    pub fn new(encoder: Arc<dyn ImageEncoder>) -> Self {
        Self {
            encoder,
            temp_root: std::env::temp_dir(),
        }
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn is_convertible(mime_type: &str) -> bool {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        CONVERTIBLE_MIME_TYPES.contains(&mime_type.as_str())
    }

    pub async fn apply(
        &self,
        file: UploadFile,
        enable_webp: bool,
    ) -> Result<ConvertedUpload, ApplicationError> {
        if !enable_webp || !Self::is_convertible(&file.mime_type) {
            debug!(
                "Auto-conversion skipped for '{}' ({})",
                file.filename, file.mime_type
            );
            return Ok(ConvertedUpload {
                file,
                converted: false,
            });
        }

        let workdir = tempfile::Builder::new()
            .prefix("auto-convert-")
            .tempdir_in(&self.temp_root)?;
        let input = workdir.path().join("input");
        let output = workdir
            .path()
            .join(format!("output.{}", self.encoder.target_extension()));

        tokio::fs::write(&input, &file.content).await?;
        self.encoder.encode_file(&input, &output).await?;
        let encoded = tokio::fs::read(&output).await?;

        let filename = replace_extension(&file.filename, self.encoder.target_extension());
        info!(
            "Auto-converted '{}' -> '{}' ({} -> {} bytes)",
            file.filename,
            filename,
            file.size,
            encoded.len()
        );

        let converted = UploadFile::new(
            encoded,
            filename,
            self.encoder.target_mime_type().to_string(),
        );

        Ok(ConvertedUpload {
            file: converted,
            converted: true,
        })
    }
}
