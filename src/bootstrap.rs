//! Startup wiring shared by the server and the batch command.

use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing_subscriber::EnvFilter;

use crate::{
    adapters::repositories::PgMediaRepository,
    application::{
        batch::BatchRecompressionJob,
        pipeline::{AutoConversion, MediaIngestService, UploadInterceptor},
        repositories::MediaRepository,
        services::{ImageEncoder, Optimizer, RemoteStore},
    },
    domain::config::settings::AppConfig,
    services::{self, CwebpEncoder, GifsicleOptimizer, StorageError},
};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Must run before any TLS client is built (reqwest, aws-sdk-s3, sqlx).
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub async fn connect_database(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.secrets.database_url)
        .await
}

pub struct Components {
    pub repository: Arc<dyn MediaRepository>,
    pub store: Arc<dyn RemoteStore>,
    pub optimizer: Arc<dyn Optimizer>,
    pub encoder: Arc<dyn ImageEncoder>,
}

impl Components {
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self, StorageError> {
        let store = services::create_remote_store(&config.store, &config.secrets)?;

        Ok(Self {
            repository: Arc::new(PgMediaRepository::new(pool)),
            store,
            optimizer: Arc::new(GifsicleOptimizer::new(config.pipeline.optimizer.clone())),
            encoder: Arc::new(CwebpEncoder::new(config.pipeline.encoder.clone())),
        })
    }

    pub fn ingest_service(&self) -> MediaIngestService {
        MediaIngestService::new(
            UploadInterceptor::new(self.optimizer.clone()),
            AutoConversion::new(self.encoder.clone()),
            self.store.clone(),
            self.repository.clone(),
        )
    }

    pub fn batch_job(&self, config: &AppConfig) -> BatchRecompressionJob {
        BatchRecompressionJob::new(
            self.repository.clone(),
            self.store.clone(),
            self.encoder.clone(),
            self.optimizer.clone(),
            config.pipeline.batch.clone(),
        )
    }
}
