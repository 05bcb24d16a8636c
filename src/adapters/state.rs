use axum::extract::FromRef;
use std::sync::{atomic::AtomicBool, Arc};

use crate::{
    application::{batch::BatchRecompressionJob, pipeline::MediaIngestService},
    domain::config::{secrets::Secrets, store::StoreConfig},
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub secrets: Arc<Secrets>,
    pub store_config: Arc<StoreConfig>,
    pub ingest_service: Arc<MediaIngestService>,
    pub batch_job: Arc<BatchRecompressionJob>,
    pub batch_running: Arc<AtomicBool>,
}
