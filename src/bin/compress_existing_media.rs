//! Re-applies the upload transformation to every stored media record.
//!
//! Environment variables: see `AppConfig::from_env`. `APP_SECRET` is required even
//! though this command serves nothing, so a misconfigured deployment fails here
//! before any record is touched.

use media_ingest::{
    bootstrap::{self, Components},
    domain::config::settings::AppConfig,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    bootstrap::init_tracing();
    bootstrap::install_crypto_provider();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting media recompression");

    let pool = match bootstrap::connect_database(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            std::process::exit(1);
        }
    };

    let components = match Components::new(&config, pool) {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let summary = match components.batch_job(&config).run().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Recompression aborted: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Recompression complete");
    tracing::info!("  Total:     {}", summary.total);
    tracing::info!("  Processed: {}", summary.processed);
    tracing::info!("  Skipped:   {}", summary.skipped);
    tracing::info!("  Errored:   {}", summary.errored);

    if summary.errored > 0 {
        tracing::warn!("Some items failed. Check logs for details.");
        std::process::exit(1);
    }
}
