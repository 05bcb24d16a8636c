use async_trait::async_trait;

use crate::domain::models::optimization::OptimizationResult;

/// Lossy recompression of animated rasters. Never fails: on any problem the
/// input comes back untouched with a non-improved outcome.
#[async_trait]
pub trait Optimizer: Send + Sync {
    async fn optimize(&self, input: Vec<u8>) -> OptimizationResult;
}
