use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::{
        error::ApplicationError,
        services::{remote_store::local_file_name, RemoteStore},
    },
    domain::config::{secrets::GcsSecrets, store::StoreConfig},
    services::error::StorageError,
};

const GCS_API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const GCS_UPLOAD_API_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const TOKEN_LIFETIME_SECS: u64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: u64,
    iat: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Google Cloud Storage over the JSON API, authenticated as a service account.
pub struct GcsStorageService {
    client: Client,
    secrets: GcsSecrets,
    store: StoreConfig,
    access_token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl GcsStorageService {
    pub fn new(secrets: GcsSecrets, store: StoreConfig) -> Result<Self, StorageError> {
        jsonwebtoken::EncodingKey::from_rsa_pem(secrets.private_key.as_bytes())
            .map_err(|e| StorageError::InvalidCredentials(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            secrets,
            store,
            access_token: tokio::sync::Mutex::new(None),
        })
    }

    async fn get_access_token(&self) -> Result<String, StorageError> {
        let mut token = self.access_token.lock().await;
        if let Some(cached) = token.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(cached.value.clone());
            }
        }

        let jwt = self.create_jwt()?;

        let response = self
            .client
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::Unauthorized(error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Unauthorized(e.to_string()))?;

        let lifetime = token_response.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        debug!("Obtained storage access token valid for {}s", lifetime);

        *token = Some(CachedToken {
            value: token_response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(token_response.access_token)
    }

    fn create_jwt(&self) -> Result<String, StorageError> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StorageError::InternalError(e.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: self.secrets.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: TOKEN_URI.to_string(),
            exp: now + TOKEN_LIFETIME_SECS,
            iat: now,
        };

        let key = EncodingKey::from_rsa_pem(self.secrets.private_key.as_bytes())
            .map_err(|e| StorageError::InvalidCredentials(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StorageError::InternalError(e.to_string()))
    }

    async fn get(&self, name: &str, media: bool) -> Result<reqwest::Response, StorageError> {
        let token = self.get_access_token().await?;
        let mut url = object_url(&self.store.bucket_name, name)?;
        if media {
            url.query_pairs_mut().append_pair("alt", "media");
        }

        Ok(self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await?)
    }

    async fn insert(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let token = self.get_access_token().await?;
        let url = upload_url(&self.store.bucket_name, name)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::ProviderError(format!(
                "Upload failed: {}",
                error_text
            )));
        }

        Ok(())
    }
}

fn object_url(bucket: &str, name: &str) -> Result<Url, StorageError> {
    let mut url = Url::parse(GCS_API_BASE).map_err(|e| StorageError::InternalError(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StorageError::InternalError("invalid storage API base".to_string()))?
        .extend(["b", bucket, "o", name]);
    Ok(url)
}

fn upload_url(bucket: &str, name: &str) -> Result<Url, StorageError> {
    let mut url =
        Url::parse(GCS_UPLOAD_API_BASE).map_err(|e| StorageError::InternalError(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StorageError::InternalError("invalid storage API base".to_string()))?
        .extend(["b", bucket, "o"]);
    url.query_pairs_mut()
        .append_pair("uploadType", "media")
        .append_pair("name", name);
    Ok(url)
}

#[async_trait]
impl RemoteStore for GcsStorageService {
    async fn exists(&self, name: &str) -> Result<bool, ApplicationError> {
        let response = self.get(name, false).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StorageError::ProviderError(format!(
                "Existence check failed with status: {}",
                status
            ))
            .into()),
        }
    }

    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApplicationError> {
        let response = self.get(name, true).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(name.to_string()).into());
        }

        if !response.status().is_success() {
            return Err(StorageError::ProviderError(format!(
                "Download failed with status: {}",
                response.status()
            ))
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::NetworkError(e.to_string()))?;

        let path = dest_dir.join(local_file_name(name));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(StorageError::from)?;

        Ok(path)
    }

    async fn upload(
        &self,
        local_path: &Path,
        name: &str,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        let content = tokio::fs::read(local_path)
            .await
            .map_err(StorageError::from)?;
        Ok(self.insert(name, content, content_type).await?)
    }

    async fn put(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        Ok(self.insert(name, content, content_type).await?)
    }

    async fn delete(&self, name: &str) -> Result<(), ApplicationError> {
        let token = self.get_access_token().await?;
        let url = object_url(&self.store.bucket_name, name)?;

        let response = self
            .client
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(StorageError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(name.to_string()).into());
        }

        if !response.status().is_success() {
            return Err(StorageError::ProviderError(format!(
                "Delete failed with status: {}",
                response.status()
            ))
            .into());
        }

        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        self.store.object_url(name)
    }
}
