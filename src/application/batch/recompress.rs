use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        dto::media_dto::MediaDTO,
        error::ApplicationError,
        pipeline::classifier,
        repositories::MediaRepository,
        services::{ImageEncoder, Optimizer, RemoteStore},
    },
    domain::{
        config::pipeline::BatchConfig,
        models::{
            batch::BatchRunSummary,
            format::{numbered_name, replace_extension, MediaFormat, GIF_MIME},
            media::MediaAsset,
        },
    },
};

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemOutcome {
    Processed { from: String, to: String },
    Skipped,
}

/// Re-applies the upload transformation to every stored record, one at a time.
///
/// A failing item is counted and logged; it never stops the run. Only a failure to
/// list the records or to create the scratch directory aborts.
pub struct BatchRecompressionJob {
    repository: Arc<dyn MediaRepository>,
    store: Arc<dyn RemoteStore>,
    encoder: Arc<dyn ImageEncoder>,
    optimizer: Arc<dyn Optimizer>,
    config: BatchConfig,
}

impl BatchRecompressionJob {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        store: Arc<dyn RemoteStore>,
        encoder: Arc<dyn ImageEncoder>,
        optimizer: Arc<dyn Optimizer>,
        config: BatchConfig,
    ) -> Self {
        Self {
            repository,
            store,
            encoder,
            optimizer,
            config,
        }
    }

    pub async fn run(&self) -> Result<BatchRunSummary, ApplicationError> {
        info!("Fetching media records...");
        let records = self.repository.list_media(self.config.page_size, 0).await?;
        let total = records.len();
        info!("Found {} media records to process", total);

        if total as u64 >= self.config.page_size as u64 {
            warn!(
                "Page size {} reached; records beyond the first page are not processed",
                self.config.page_size
            );
        }

        let scratch = self
            .config
            .scratch_root
            .join(format!("run-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&scratch).await?;

        let mut summary = BatchRunSummary {
            total,
            ..Default::default()
        };

        for (index, media) in records.iter().enumerate() {
            let label = media.filename.as_deref().unwrap_or("<no filename>");

            match self.process_item(media, &scratch).await {
                Ok(ItemOutcome::Processed { from, to }) => {
                    summary.processed += 1;
                    info!(
                        "Processed {} -> {} ({}/{})",
                        from,
                        to,
                        summary.processed,
                        total
                    );
                }
                Ok(ItemOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.errored += 1;
                    error!("Error processing {}: {}", label, e);
                }
            }

            if index + 1 < total && !self.config.throttle.is_zero() {
                tokio::time::sleep(self.config.throttle).await;
            }
        }

        let _ = tokio::fs::remove_dir_all(&scratch).await;
        // Only succeeds when no other run is using the root.
        let _ = tokio::fs::remove_dir(&self.config.scratch_root).await;

        info!(
            "Recompression complete: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.errored
        );

        Ok(summary)
    }

    async fn process_item(
        &self,
        media: &MediaAsset,
        scratch: &Path,
    ) -> Result<ItemOutcome, ApplicationError> {
        let filename = match media.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                info!("Skipping media {} with no filename", media.id);
                return Ok(ItemOutcome::Skipped);
            }
        };

        let format = classifier::classify(&media.mime_type, filename);
        if format == MediaFormat::Other {
            info!("Skipping {}: not a raster image ({})", filename, media.mime_type);
            return Ok(ItemOutcome::Skipped);
        }

        if !self.store.exists(filename).await? {
            info!("File {} not found in store, skipping", filename);
            return Ok(ItemOutcome::Skipped);
        }

        info!("Processing {}", filename);

        // Removed on drop, whichever way this item ends.
        let workdir = tempfile::Builder::new()
            .prefix("item-")
            .tempdir_in(scratch)?;

        // Downloads live apart from the encoder output.
        let source_dir = workdir.path().join("source");
        tokio::fs::create_dir(&source_dir).await?;
        let local = self.store.download(filename, &source_dir).await?;

        if format.is_animated() {
            self.optimize_animated(media, filename, &local).await
        } else {
            self.reencode(media, filename, &local, workdir.path()).await
        }
    }

    async fn reencode(
        &self,
        media: &MediaAsset,
        filename: &str,
        local: &Path,
        workdir: &Path,
    ) -> Result<ItemOutcome, ApplicationError> {
        let extension = self.encoder.target_extension();
        let compressed: PathBuf = workdir.join(format!("compressed.{}", extension));

        self.encoder.encode_file(local, &compressed).await?;

        let content_type = self.encoder.target_mime_type();
        let filesize = tokio::fs::metadata(&compressed).await?.len();

        let target = self
            .claim_target(media, filename, content_type, filesize)
            .await?;

        if let Err(e) = self.store.upload(&compressed, &target, content_type).await {
            let mut revert = MediaDTO::for_update(media.id);
            revert.filename = media.filename.clone();
            revert.mime_type = Some(media.mime_type.clone());
            revert.filesize = Some(media.filesize);
            revert.url = Some(media.url.clone());
            revert.enable_webp = Some(media.enable_webp);
            if let Err(revert_error) = self.repository.update_media(revert).await {
                warn!(
                    "Could not restore record {} after failed upload: {}",
                    media.id, revert_error
                );
            }
            return Err(e);
        }

        Ok(ItemOutcome::Processed {
            from: filename.to_string(),
            to: target,
        })
    }

    /// Points the record at the first free target name and returns it. A name is free
    /// when it is the item's own name, or when neither an object nor a record holds it.
    async fn claim_target(
        &self,
        media: &MediaAsset,
        filename: &str,
        content_type: &str,
        filesize: u64,
    ) -> Result<String, ApplicationError> {
        let target = replace_extension(filename, self.encoder.target_extension());

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = numbered_name(&target, attempt);
            if candidate != filename && self.store.exists(&candidate).await? {
                debug!("Target {} already exists in store", candidate);
                continue;
            }

            let mut update = MediaDTO::for_update(media.id);
            update.filename = Some(candidate.clone());
            update.mime_type = Some(content_type.to_string());
            update.filesize = Some(filesize);
            update.url = Some(self.store.public_url(&candidate));
            update.enable_webp = Some(true);

            match self.repository.update_media(update).await {
                Ok(_) => return Ok(candidate),
                Err(ApplicationError::Conflict(msg)) => {
                    debug!("Target {} held by another record: {}", candidate, msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(ApplicationError::Conflict(format!(
            "no free target name for '{}'",
            filename
        )))
    }

    /// Animated files keep their format; they only get the lossy GIF pass.
    async fn optimize_animated(
        &self,
        media: &MediaAsset,
        filename: &str,
        local: &Path,
    ) -> Result<ItemOutcome, ApplicationError> {
        let original = tokio::fs::read(local).await?;
        let result = self.optimizer.optimize(original).await;

        if !result.is_improved() {
            info!("{} kept as is ({:?})", filename, result.outcome);
            return Ok(ItemOutcome::Processed {
                from: filename.to_string(),
                to: filename.to_string(),
            });
        }

        let filesize = result.buffer.len() as u64;
        self.store.put(filename, result.buffer, GIF_MIME).await?;

        let mut update = MediaDTO::for_update(media.id);
        update.mime_type = Some(GIF_MIME.to_string());
        update.filesize = Some(filesize);
        update.enable_webp = Some(false);
        self.repository.update_media(update).await?;

        Ok(ItemOutcome::Processed {
            from: filename.to_string(),
            to: filename.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        domain::models::format::WEBP_MIME,
        testing::{media_asset, FakeEncoder, FakeOptimizer, MemoryMediaRepository, MemoryStore},
    };

    struct Harness {
        job: BatchRecompressionJob,
        store: Arc<MemoryStore>,
        repository: Arc<MemoryMediaRepository>,
        scratch_root: PathBuf,
        _temp: TempDir,
    }

    fn harness(records: Vec<MediaAsset>, encoder: FakeEncoder, optimizer: FakeOptimizer) -> Harness {
        let temp = TempDir::new().unwrap();
        let scratch_root = temp.path().join("scratch");
        let store = Arc::new(MemoryStore::new());
        let repository = Arc::new(MemoryMediaRepository::with_records(records));

        let job = BatchRecompressionJob::new(
            repository.clone(),
            store.clone(),
            Arc::new(encoder),
            Arc::new(optimizer),
            BatchConfig {
                page_size: 1000,
                throttle: Duration::ZERO,
                scratch_root: scratch_root.clone(),
            },
        );

        Harness {
            job,
            store,
            repository,
            scratch_root,
            _temp: temp,
        }
    }

    #[tokio::test]
    async fn missing_object_is_skipped_without_update() {
        let records = vec![
            media_asset("one.jpg", "image/jpeg"),
            media_asset("two.png", "image/png"),
            media_asset("three.png", "image/png"),
        ];
        let ids: Vec<_> = records.iter().map(|m| m.id).collect();
        let h = harness(records, FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("one.jpg", vec![5u8; 400], "image/jpeg");
        h.store.insert("three.png", vec![6u8; 600], "image/png");

        let summary = h.job.run().await.unwrap();

        assert_eq!(
            summary,
            BatchRunSummary {
                total: 3,
                processed: 2,
                skipped: 1,
                errored: 0
            }
        );
        assert_eq!(h.repository.update_calls().len(), 2);

        let first = h.repository.get(ids[0]).unwrap();
        assert_eq!(first.filename.as_deref(), Some("one.webp"));
        assert_eq!(first.mime_type, WEBP_MIME);
        assert_eq!(first.url, h.store.public_url("one.webp"));
        assert_eq!(first.filesize, h.store.object("one.webp").unwrap().0.len() as u64);

        let second = h.repository.get(ids[1]).unwrap();
        assert_eq!(second.mime_type, "image/png");

        let third = h.repository.get(ids[2]).unwrap();
        assert_eq!(third.mime_type, WEBP_MIME);
        assert_eq!(h.store.object("three.webp").unwrap().1, WEBP_MIME);
        // Originals stay in the store.
        assert!(h.store.object("one.jpg").is_some());
    }

    #[tokio::test]
    async fn one_failing_item_does_not_stop_the_run() {
        let records = vec![
            media_asset("a.png", "image/png"),
            media_asset("b.png", "image/png"),
            media_asset("c.png", "image/png"),
        ];
        let h = harness(
            records,
            FakeEncoder::failing_on(b"CORRUPT"),
            FakeOptimizer::returning(vec![]),
        );
        h.store.insert("a.png", vec![1u8; 10], "image/png");
        h.store.insert("b.png", b"CORRUPT bytes".to_vec(), "image/png");
        h.store.insert("c.png", vec![3u8; 10], "image/png");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(h.repository.update_calls().len(), 2);
        assert!(h.store.object("b.webp").is_none());
        assert!(!h.scratch_root.exists());
    }

    #[tokio::test]
    async fn download_failure_is_counted_as_error() {
        let records = vec![media_asset("gone.png", "image/png")];
        let h = harness(records, FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("gone.png", vec![1u8; 10], "image/png");
        h.store.fail_downloads_of("gone.png");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.errored, 1);
        assert_eq!(summary.processed, 0);
        assert!(h.repository.update_calls().is_empty());
        assert!(!h.scratch_root.exists());
    }

    #[tokio::test]
    async fn records_without_filename_are_skipped() {
        let mut record = media_asset("x.png", "image/png");
        record.filename = None;
        let h = harness(vec![record], FakeEncoder::new(), FakeOptimizer::returning(vec![]));

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 0);
        assert!(h.repository.update_calls().is_empty());
    }

    #[tokio::test]
    async fn webp_names_are_reused() {
        let record = media_asset("hero.webp", "image/webp");
        let id = record.id;
        let h = harness(vec![record], FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("hero.webp", vec![8u8; 100], "image/webp");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        let updated = h.repository.get(id).unwrap();
        assert_eq!(updated.filename.as_deref(), Some("hero.webp"));
        assert_eq!(h.store.object("hero.webp").unwrap().1, WEBP_MIME);
    }

    #[tokio::test]
    async fn animated_records_are_optimized_not_converted() {
        let record = media_asset("loop.gif", "image/gif");
        let id = record.id;
        let optimizer = FakeOptimizer::returning(vec![2u8; 300]);
        let h = harness(vec![record], FakeEncoder::new(), optimizer);
        h.store.insert("loop.gif", vec![1u8; 1_000], "image/gif");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        assert!(h.store.object("loop.webp").is_none());
        let (bytes, content_type) = h.store.object("loop.gif").unwrap();
        assert_eq!(bytes.len(), 300);
        assert_eq!(content_type, GIF_MIME);

        let updated = h.repository.get(id).unwrap();
        assert_eq!(updated.mime_type, GIF_MIME);
        assert_eq!(updated.filesize, 300);
        assert!(!updated.enable_webp);
    }

    #[tokio::test]
    async fn non_raster_records_are_skipped() {
        let record = media_asset("manual.pdf", "application/pdf");
        let h = harness(vec![record], FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("manual.pdf", vec![1u8; 10], "application/pdf");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(h.repository.update_calls().is_empty());
    }

    #[tokio::test]
    async fn colliding_targets_get_distinct_names() {
        let first = media_asset("a.jpg", "image/jpeg");
        let second = media_asset("a.png", "image/png");
        let (first_id, second_id) = (first.id, second.id);
        let h = harness(
            vec![first, second],
            FakeEncoder::new(),
            FakeOptimizer::returning(vec![]),
        );
        h.store.insert("a.jpg", vec![1u8; 400], "image/jpeg");
        h.store.insert("a.png", vec![2u8; 1_000], "image/png");

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.errored, 0);

        let first = h.repository.get(first_id).unwrap();
        let second = h.repository.get(second_id).unwrap();
        assert_eq!(first.filename.as_deref(), Some("a.webp"));
        assert_eq!(second.filename.as_deref(), Some("a-1.webp"));

        for media in [&first, &second] {
            let name = media.filename.as_deref().unwrap();
            let (bytes, content_type) = h.store.object(name).unwrap();
            assert_eq!(bytes.len() as u64, media.filesize);
            assert_eq!(content_type, WEBP_MIME);
            assert_eq!(media.url, h.store.public_url(name));
        }
    }

    #[tokio::test]
    async fn existing_object_under_target_name_is_not_overwritten() {
        let record = media_asset("banner.png", "image/png");
        let id = record.id;
        let h = harness(vec![record], FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("banner.png", vec![4u8; 200], "image/png");
        h.store.insert("banner.webp", b"someone else".to_vec(), WEBP_MIME);

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(h.store.object("banner.webp").unwrap().0, b"someone else".to_vec());
        let updated = h.repository.get(id).unwrap();
        assert_eq!(updated.filename.as_deref(), Some("banner-1.webp"));
    }

    #[tokio::test]
    async fn source_and_output_never_share_a_path() {
        let record = media_asset("compressed.webp", "image/webp");
        let encoder = Arc::new(FakeEncoder::new());
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.insert("compressed.webp", vec![9u8; 100], "image/webp");

        let job = BatchRecompressionJob::new(
            Arc::new(MemoryMediaRepository::with_records(vec![record])),
            store.clone(),
            encoder.clone(),
            Arc::new(FakeOptimizer::returning(vec![])),
            BatchConfig {
                page_size: 10,
                throttle: Duration::ZERO,
                scratch_root: temp.path().join("scratch"),
            },
        );

        let summary = job.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        let paths = encoder.paths();
        assert_eq!(paths.len(), 1);
        assert_ne!(paths[0].0, paths[0].1);
        assert_eq!(store.object("compressed.webp").unwrap().0.len(), 8 + 50);
    }

    #[tokio::test]
    async fn failed_upload_restores_the_record() {
        let record = media_asset("photo.png", "image/png");
        let original = record.clone();
        let h = harness(vec![record], FakeEncoder::new(), FakeOptimizer::returning(vec![]));
        h.store.insert("photo.png", vec![3u8; 64], "image/png");
        h.store.fail_puts();

        let summary = h.job.run().await.unwrap();

        assert_eq!(summary.errored, 1);
        let restored = h.repository.get(original.id).unwrap();
        assert_eq!(restored.filename, original.filename);
        assert_eq!(restored.mime_type, original.mime_type);
        assert_eq!(restored.filesize, original.filesize);
        assert_eq!(restored.url, original.url);
        assert!(h.store.object("photo.webp").is_none());
    }
}
