use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info, warn};

use crate::{
    adapters::{dto::recompress_dto::RecompressAccepted, state::AppState},
    application::error::ApplicationError,
};

/// Clears the running flag when the background run ends, however it ends.
struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for RunningFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AdminController;

impl AdminController {
    /// POST /api/v1/admin/recompress
    pub async fn recompress(
        State(app_state): State<AppState>,
    ) -> Result<(StatusCode, Json<RecompressAccepted>), ApplicationError> {
        let guard = RunningFlag::acquire(&app_state.batch_running).ok_or_else(|| {
            warn!("Recompression requested while a run is active");
            ApplicationError::Conflict("a recompression run is already active".to_string())
        })?;

        let job = app_state.batch_job.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match job.run().await {
                Ok(summary) => info!(
                    "Background recompression finished: {} total, {} processed, {} skipped, {} errored",
                    summary.total, summary.processed, summary.skipped, summary.errored
                ),
                Err(e) => error!("Background recompression aborted: {}", e),
            }
        });

        info!("Background recompression started");
        Ok((
            StatusCode::ACCEPTED,
            Json(RecompressAccepted { status: "started" }),
        ))
    }
}
