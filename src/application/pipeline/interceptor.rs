use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    application::{pipeline::classifier, services::Optimizer},
    domain::models::{
        format::OPAQUE_MIME,
        optimization::OptimizationOutcome,
        upload::{Operation, UploadDecision, UploadFile},
    },
};

/// `beforeOperation` stage: runs before the host transcodes anything.
pub struct UploadInterceptor {
    optimizer: Arc<dyn Optimizer>,
}

impl UploadInterceptor {
    pub fn new(optimizer: Arc<dyn Optimizer>) -> Self {
        Self { optimizer }
    }

    /// Mutates a create-type upload in place and returns the decision the
    /// persistence stage needs. Other operations pass through untouched.
    pub async fn before_operation(
        &self,
        operation: Operation,
        mut file: UploadFile,
    ) -> (UploadFile, UploadDecision) {
        let format = classifier::classify(&file.mime_type, &file.filename);

        if operation != Operation::Create {
            let decision = UploadDecision::passthrough(format, &file.mime_type);
            return (file, decision);
        }

        let normalized = classifier::normalize_filename(&file.filename);
        if normalized != file.filename {
            debug!("Normalized filename '{}' -> '{}'", file.filename, normalized);
            file.filename = normalized;
        }

        if !format.is_animated() {
            let decision = UploadDecision::passthrough(format, &file.mime_type);
            return (file, decision);
        }

        let original_size = file.size;
        let content = std::mem::take(&mut file.content);
        let result = self.optimizer.optimize(content).await;

        match result.outcome {
            OptimizationOutcome::OptimizedSmaller => {
                info!(
                    "Optimized '{}': {} -> {} bytes",
                    file.filename,
                    original_size,
                    result.buffer.len()
                );
            }
            OptimizationOutcome::Failed => {
                warn!(
                    "Optimizer failed for '{}', keeping original bytes",
                    file.filename
                );
            }
            outcome => {
                debug!("Keeping original bytes for '{}' ({:?})", file.filename, outcome);
            }
        }
        // Non-improved outcomes hand the original buffer back.
        file.replace_content(result.buffer);

        let decision = UploadDecision {
            format,
            original_mime_type: file.mime_type.clone(),
            skip_auto_convert: true,
        };

        info!(
            "Substituting MIME type '{}' with '{}' for '{}' to bypass auto-conversion",
            file.mime_type, OPAQUE_MIME, file.filename
        );
        file.mime_type = OPAQUE_MIME.to_string();

        (file, decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::models::format::MediaFormat, testing::FakeOptimizer};

    fn upload(name: &str, mime: &str, len: usize) -> UploadFile {
        UploadFile::new(vec![7u8; len], name.to_string(), mime.to_string())
    }

    #[tokio::test]
    async fn animated_upload_is_optimized_and_spoofed() {
        let optimizer = Arc::new(FakeOptimizer::returning(vec![1u8; 30_000]));
        let interceptor = UploadInterceptor::new(optimizer.clone());

        let (file, decision) = interceptor
            .before_operation(Operation::Create, upload("beach vacation.GIF", "image/gif", 50_000))
            .await;

        assert_eq!(file.filename, "beach-vacation.GIF");
        assert_eq!(file.mime_type, OPAQUE_MIME);
        assert_eq!(file.size, 30_000);
        assert_eq!(file.content.len(), 30_000);
        assert_eq!(decision.format, MediaFormat::AnimatedRaster);
        assert_eq!(decision.original_mime_type, "image/gif");
        assert!(decision.skip_auto_convert);
        assert_eq!(optimizer.calls(), 1);
    }

    #[tokio::test]
    async fn failed_optimization_keeps_original_bytes() {
        let optimizer = Arc::new(FakeOptimizer::failing());
        let interceptor = UploadInterceptor::new(optimizer);

        let original = upload("loop.gif", "image/gif", 1_000);
        let (file, decision) = interceptor
            .before_operation(Operation::Create, original.clone())
            .await;

        assert_eq!(file.content, original.content);
        assert_eq!(file.size, 1_000);
        assert_eq!(file.mime_type, OPAQUE_MIME);
        assert!(decision.skip_auto_convert);
    }

    #[tokio::test]
    async fn static_raster_is_not_touched() {
        let optimizer = Arc::new(FakeOptimizer::returning(vec![0u8; 1]));
        let interceptor = UploadInterceptor::new(optimizer.clone());

        let (file, decision) = interceptor
            .before_operation(Operation::Create, upload("my photo.png", "image/png", 500))
            .await;

        assert_eq!(file.filename, "my-photo.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 500);
        assert_eq!(decision.format, MediaFormat::StaticRaster);
        assert!(!decision.skip_auto_convert);
        assert_eq!(optimizer.calls(), 0);
    }

    #[tokio::test]
    async fn non_create_operations_pass_through() {
        let optimizer = Arc::new(FakeOptimizer::returning(vec![0u8; 1]));
        let interceptor = UploadInterceptor::new(optimizer.clone());

        let (file, decision) = interceptor
            .before_operation(Operation::Update, upload("old clip.gif", "image/gif", 10))
            .await;

        assert_eq!(file.filename, "old clip.gif");
        assert_eq!(file.mime_type, "image/gif");
        assert!(!decision.skip_auto_convert);
        assert_eq!(optimizer.calls(), 0);
    }
}
