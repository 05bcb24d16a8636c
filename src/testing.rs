//! In-memory stand-ins for the capability traits, shared by unit tests.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::{
        dto::media_dto::MediaDTO,
        error::ApplicationError,
        repositories::MediaRepository,
        services::{remote_store::local_file_name, ImageEncoder, Optimizer, RemoteStore},
    },
    domain::models::{
        format::{WEBP_EXTENSION, WEBP_MIME},
        media::MediaAsset,
        optimization::{OptimizationOutcome, OptimizationResult},
    },
};

pub fn media_asset(filename: &str, mime_type: &str) -> MediaAsset {
    let now = Utc::now();
    MediaAsset {
        id: Uuid::new_v4(),
        alt: format!("alt for {}", filename),
        filename: Some(filename.to_string()),
        mime_type: mime_type.to_string(),
        filesize: 0,
        url: format!("https://storage.test/media/{}", filename),
        enable_webp: true,
        created_at: now,
        updated_at: now,
    }
}

/// Yields before every transfer so concurrent callers interleave like real I/O.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failing_downloads: Mutex<HashSet<String>>,
    fail_put: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, content: Vec<u8>, content_type: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), (content, content_type.to_string()));
    }

    pub fn object(&self, name: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn fail_downloads_of(&self, name: &str) {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    pub fn fail_puts(&self) {
        self.fail_put.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn exists(&self, name: &str) -> Result<bool, ApplicationError> {
        tokio::task::yield_now().await;
        Ok(self.objects.lock().unwrap().contains_key(name))
    }

    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApplicationError> {
        if self.failing_downloads.lock().unwrap().contains(name) {
            return Err(ApplicationError::StorageError(format!(
                "connection reset while downloading {}",
                name
            )));
        }

        let (content, _) = self.object(name).ok_or(ApplicationError::NotFound)?;
        let path = dest_dir.join(local_file_name(name));
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    async fn upload(
        &self,
        local_path: &Path,
        name: &str,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        let content = tokio::fs::read(local_path).await?;
        self.put(name, content, content_type).await
    }

    async fn put(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        tokio::task::yield_now().await;
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(ApplicationError::StorageError(format!(
                "bucket rejected {}",
                name
            )));
        }
        self.insert(name, content, content_type);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), ApplicationError> {
        self.objects
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or(ApplicationError::NotFound)
    }

    fn public_url(&self, name: &str) -> String {
        format!("https://storage.test/media/{}", name)
    }
}

#[derive(Default)]
pub struct MemoryMediaRepository {
    records: Mutex<Vec<MediaAsset>>,
    updates: Mutex<Vec<MediaDTO>>,
    fail_create: AtomicBool,
}

impl MemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MediaAsset>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn get(&self, id: Uuid) -> Option<MediaAsset> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn update_calls(&self) -> Vec<MediaDTO> {
        self.updates.lock().unwrap().clone()
    }

    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaRepository for MemoryMediaRepository {
    async fn create_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApplicationError::DatabaseError(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }

        let mut media = media;
        media.id = Some(Uuid::new_v4());
        let created: MediaAsset = media.into();

        let mut records = self.records.lock().unwrap();
        if filename_taken(&records, created.filename.as_deref(), None) {
            return Err(ApplicationError::Conflict(
                "duplicate key value violates unique constraint \"assets_filename_key\"".to_string(),
            ));
        }
        records.push(created.clone());
        Ok(created)
    }

    async fn get_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError> {
        self.get(id).ok_or(ApplicationError::NotFound)
    }

    async fn list_media(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MediaAsset>, ApplicationError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_media(&self, media: MediaDTO) -> Result<MediaAsset, ApplicationError> {
        self.updates.lock().unwrap().push(media.clone());

        let id = media.id.ok_or(ApplicationError::NotFound)?;
        let mut records = self.records.lock().unwrap();
        if filename_taken(&records, media.filename.as_deref(), Some(id)) {
            return Err(ApplicationError::Conflict(
                "duplicate key value violates unique constraint \"assets_filename_key\"".to_string(),
            ));
        }
        let record = records
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ApplicationError::NotFound)?;

        if let Some(alt) = media.alt {
            record.alt = alt;
        }
        if let Some(filename) = media.filename {
            record.filename = Some(filename);
        }
        if let Some(mime_type) = media.mime_type {
            record.mime_type = mime_type;
        }
        if let Some(filesize) = media.filesize {
            record.filesize = filesize;
        }
        if let Some(url) = media.url {
            record.url = url;
        }
        if let Some(enable_webp) = media.enable_webp {
            record.enable_webp = enable_webp;
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete_media(&self, id: Uuid) -> Result<MediaAsset, ApplicationError> {
        let mut records = self.records.lock().unwrap();
        let index = records
            .iter()
            .position(|m| m.id == id)
            .ok_or(ApplicationError::NotFound)?;
        Ok(records.remove(index))
    }
}

fn filename_taken(records: &[MediaAsset], filename: Option<&str>, except: Option<Uuid>) -> bool {
    filename.is_some_and(|name| {
        records
            .iter()
            .any(|m| m.filename.as_deref() == Some(name) && Some(m.id) != except)
    })
}

/// Returns a fixed buffer, keeping the optimizer's "never larger" contract.
pub struct FakeOptimizer {
    output: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeOptimizer {
    pub fn returning(output: Vec<u8>) -> Self {
        Self {
            output: Some(output),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            output: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Optimizer for FakeOptimizer {
    async fn optimize(&self, input: Vec<u8>) -> OptimizationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.output {
            Some(output) if !output.is_empty() && output.len() < input.len() => {
                OptimizationResult {
                    buffer: output.clone(),
                    outcome: OptimizationOutcome::OptimizedSmaller,
                }
            }
            Some(_) => OptimizationResult::unchanged(input, OptimizationOutcome::OptimizedNotSmaller),
            None => OptimizationResult::unchanged(input, OptimizationOutcome::Failed),
        }
    }
}

/// Writes a fake WebP made of a header plus the first half of the input.
pub struct FakeEncoder {
    fail_prefix: Option<Vec<u8>>,
    calls: AtomicUsize,
    paths: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self {
            fail_prefix: None,
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(prefix: &[u8]) -> Self {
        Self {
            fail_prefix: Some(prefix.to_vec()),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(input, output)` of every call, in order.
    pub fn paths(&self) -> Vec<(PathBuf, PathBuf)> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEncoder for FakeEncoder {
    fn target_mime_type(&self) -> &'static str {
        WEBP_MIME
    }

    fn target_extension(&self) -> &'static str {
        WEBP_EXTENSION
    }

    async fn encode_file(&self, input: &Path, output: &Path) -> Result<(), ApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        let content = tokio::fs::read(input).await?;

        if let Some(prefix) = &self.fail_prefix {
            if content.starts_with(prefix) {
                return Err(ApplicationError::ProcessingError(format!(
                    "cannot decode {}",
                    input.display()
                )));
            }
        }

        let mut encoded = b"RIFFWEBP".to_vec();
        encoded.extend_from_slice(&content[..content.len() / 2]);
        tokio::fs::write(output, encoded).await?;
        Ok(())
    }
}
