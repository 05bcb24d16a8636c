pub mod classifier;
pub mod conversion;
pub mod ingest;
pub mod interceptor;
pub mod reconciler;

pub use conversion::AutoConversion;
pub use ingest::{CreateMediaRequest, MediaIngestService};
pub use interceptor::UploadInterceptor;
pub use reconciler::PersistenceReconciler;
