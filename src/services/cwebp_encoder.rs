use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    application::{error::ApplicationError, services::ImageEncoder},
    domain::{
        config::pipeline::EncoderConfig,
        models::format::{WEBP_EXTENSION, WEBP_MIME},
    },
    services::process::run_bounded,
};

const MAX_DIAGNOSTIC_BYTES: u64 = 1024 * 1024;

/// Lossy WebP encoding through the `cwebp` command line tool.
pub struct CwebpEncoder {
    config: EncoderConfig,
}

impl CwebpEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-quiet".into(),
            "-q".into(),
            self.config.quality.to_string().into(),
            "-m".into(),
            "4".into(),
            "-mt".into(),
            input.as_os_str().to_owned(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl ImageEncoder for CwebpEncoder {
    fn target_mime_type(&self) -> &'static str {
        WEBP_MIME
    }

    fn target_extension(&self) -> &'static str {
        WEBP_EXTENSION
    }

    async fn encode_file(&self, input: &Path, output: &Path) -> Result<(), ApplicationError> {
        debug!(
            "Encoding {} -> {} (quality {})",
            input.display(),
            output.display(),
            self.config.quality
        );

        run_bounded(
            &self.config.program,
            &self.args(input, output),
            self.config.timeout,
            MAX_DIAGNOSTIC_BYTES,
        )
        .await?;

        let written = tokio::fs::metadata(output).await.map_err(|e| {
            ApplicationError::ProcessingError(format!(
                "{} produced no output: {}",
                self.config.program.display(),
                e
            ))
        })?;
        if written.len() == 0 {
            return Err(ApplicationError::ProcessingError(format!(
                "{} produced an empty file",
                self.config.program.display()
            )));
        }

        Ok(())
    }
}
