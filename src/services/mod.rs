mod cwebp_encoder;
mod error;
mod gcs_storage;
mod gifsicle_optimizer;
mod process;
mod s3_storage;

pub use cwebp_encoder::CwebpEncoder;
pub use error::StorageError;
pub use gcs_storage::GcsStorageService;
pub use gifsicle_optimizer::GifsicleOptimizer;
pub use process::ProcessError;
pub use s3_storage::S3StorageService;

use std::sync::Arc;

use crate::{
    application::services::RemoteStore,
    domain::config::{
        secrets::Secrets,
        store::{Provider, StoreConfig},
    },
};

pub fn create_remote_store(
    store: &StoreConfig,
    secrets: &Secrets,
) -> Result<Arc<dyn RemoteStore>, StorageError> {
    match store.provider {
        Provider::Gcs => {
            let gcs_secrets = secrets.gcs_secrets.as_ref().ok_or_else(|| {
                StorageError::InvalidCredentials("GCS secrets not found".to_string())
            })?;

            let service = GcsStorageService::new(gcs_secrets.clone(), store.clone())?;
            Ok(Arc::new(service))
        }
        Provider::S3 => {
            let s3_secrets = secrets.s3_secrets.as_ref().ok_or_else(|| {
                StorageError::InvalidCredentials("S3 secrets not found".to_string())
            })?;

            let service = S3StorageService::new(s3_secrets.clone(), store.clone());
            Ok(Arc::new(service))
        }
    }
}
