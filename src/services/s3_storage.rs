use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use tracing::debug;

use crate::{
    application::{
        error::ApplicationError,
        services::{remote_store::local_file_name, RemoteStore},
    },
    domain::config::{secrets::S3Secrets, store::StoreConfig},
    services::error::StorageError,
};

/// Any S3-compatible object store (AWS, R2, MinIO) addressed path-style.
pub struct S3StorageService {
    client: Client,
    store: StoreConfig,
}

impl S3StorageService {
    pub fn new(secrets: S3Secrets, store: StoreConfig) -> Self {
        let credentials = Credentials::new(
            secrets.access_key_id,
            secrets.secret_access_key,
            None,
            None,
            "media-ingest",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(secrets.region))
            .endpoint_url(secrets.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
            store,
        }
    }

    fn bucket(&self) -> &str {
        &self.store.bucket_name
    }
}

fn provider_error<E>(action: &str, name: &str, error: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::ProviderError(format!(
        "{} '{}' failed: {}",
        action,
        name,
        DisplayErrorContext(error)
    ))
}

#[async_trait]
impl RemoteStore for S3StorageService {
    async fn exists(&self, name: &str) -> Result<bool, ApplicationError> {
        match self
            .client
            .head_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(provider_error("Head", name, e).into()),
        }
    }

    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApplicationError> {
        let response = match self
            .client
            .get_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(StorageError::NotFound(name.to_string()).into())
            }
            Err(e) => return Err(provider_error("Download", name, e).into()),
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::NetworkError(e.to_string()))?
            .into_bytes();

        let path = dest_dir.join(local_file_name(name));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(StorageError::from)?;

        debug!("Downloaded '{}' ({} bytes)", name, bytes.len());
        Ok(path)
    }

    async fn upload(
        &self,
        local_path: &Path,
        name: &str,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::InternalError(format!("Local file error: {}", e)))?;

        self.client
            .put_object()
            .bucket(self.bucket())
            .key(name)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| provider_error("Upload", name, e))?;

        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        self.client
            .put_object()
            .bucket(self.bucket())
            .key(name)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| provider_error("Upload", name, e))?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), ApplicationError> {
        self.client
            .delete_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|e| provider_error("Delete", name, e))?;

        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        self.store.object_url(name)
    }
}
