use std::sync::{atomic::AtomicBool, Arc};

use media_ingest::{
    adapters::{router::create_router, state::AppState},
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

    tracing::info!(
        "Starting media-ingest with {} storage (bucket '{}')",
        config.store.provider.as_str(),
        config.store.bucket_name
    );

    tracing::info!("Connecting to database...");
    let pool = match bootstrap::connect_database(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Database connection established");

    let components = match Components::new(&config, pool) {
        Ok(components) => components,
        Err(e) => {
            tracing::error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        secrets: Arc::new(config.secrets.clone()),
        store_config: Arc::new(config.store.clone()),
        ingest_service: Arc::new(components.ingest_service()),
        batch_job: Arc::new(components.batch_job(&config)),
        batch_running: Arc::new(AtomicBool::new(false)),
    };

    let router = create_router(app_state, &config.server);

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to port {}: {}", config.server.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on 0.0.0.0:{}", config.server.port);

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
