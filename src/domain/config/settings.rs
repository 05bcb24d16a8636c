use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::domain::config::{
    pipeline::PipelineConfig,
    secrets::{GcsSecrets, S3Secrets, Secrets},
    store::{Provider, StoreConfig, GCS_PUBLIC_BASE_URL},
};

const DEFAULT_BUCKET: &str = "cms-media";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub max_upload_bytes: usize,
}

/// Process-wide configuration, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        // The secret is checked first so a bare environment reports it before anything else.
        let app_secret = require("APP_SECRET")?;
        let database_url = require("DATABASE_URL")?;

        let provider = match get("STORAGE_PROVIDER").as_deref() {
            None | Some("gcs") => Provider::Gcs,
            Some("s3") => Provider::S3,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_PROVIDER",
                    reason: format!("unknown provider '{}'", other),
                })
            }
        };

        let (gcs_secrets, s3_secrets) = match provider {
            Provider::Gcs => {
                let secrets = GcsSecrets {
                    client_email: require("GOOGLE_CLOUD_CLIENT_EMAIL")?,
                    private_key: require("GOOGLE_CLOUD_PRIVATE_KEY")?.replace("\\n", "\n"),
                };
                (Some(secrets), None)
            }
            Provider::S3 => {
                let secrets = S3Secrets {
                    endpoint: require("S3_ENDPOINT")?,
                    region: get("S3_REGION").unwrap_or_else(|| "auto".to_string()),
                    access_key_id: require("S3_ACCESS_KEY_ID")?,
                    secret_access_key: require("S3_SECRET_ACCESS_KEY")?,
                };
                (None, Some(secrets))
            }
        };

        let public_base_url = match (get("STORAGE_PUBLIC_BASE_URL"), &s3_secrets) {
            (Some(url), _) => url,
            (None, Some(s3)) => s3.endpoint.clone(),
            (None, None) => GCS_PUBLIC_BASE_URL.to_string(),
        };

        let store = StoreConfig {
            provider,
            bucket_name: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            public_base_url,
        };

        let mut pipeline = PipelineConfig::default();
        if let Some(path) = get("GIFSICLE_PATH") {
            pipeline.optimizer.program = PathBuf::from(path);
        }
        if let Some(path) = get("CWEBP_PATH") {
            pipeline.encoder.program = PathBuf::from(path);
        }
        if let Some(size) = get("BATCH_PAGE_SIZE") {
            pipeline.batch.page_size = parse("BATCH_PAGE_SIZE", &size)?;
        }
        if let Some(ms) = get("BATCH_THROTTLE_MS") {
            pipeline.batch.throttle = Duration::from_millis(parse("BATCH_THROTTLE_MS", &ms)?);
        }
        if let Some(dir) = get("BATCH_SCRATCH_DIR") {
            pipeline.batch.scratch_root = PathBuf::from(dir);
        }

        let server = ServerConfig {
            port: match get("PORT") {
                Some(port) => parse("PORT", &port)?,
                None => DEFAULT_PORT,
            },
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS").map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            max_upload_bytes: match get("MAX_UPLOAD_BYTES") {
                Some(bytes) => parse("MAX_UPLOAD_BYTES", &bytes)?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        };

        Ok(Self {
            secrets: Secrets {
                app_secret,
                database_url,
                gcs_secrets,
                s3_secrets,
            },
            store,
            pipeline,
            server,
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
