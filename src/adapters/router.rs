use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::warn;

use crate::{
    adapters::{
        controllers::{
            admin_controller::AdminController, health_controller::HealthController,
            media_controller::MediaController,
        },
        middleware::validate_admin_secret,
        state::AppState,
    },
    domain::config::settings::ServerConfig,
};

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    match &server.cors_allowed_origins {
        Some(allowed_origins) => {
            let origins: Vec<HeaderValue> = allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    }
}

pub fn create_router(app_state: AppState, server: &ServerConfig) -> Router {
    // Protected routes that require X-Admin-Secret header
    let admin_routes = Router::new()
        .route("/api/v1/admin/recompress", post(AdminController::recompress))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            validate_admin_secret,
        ));

    let public_routes = Router::new()
        .route("/api/v1/health", get(HealthController::health_check))
        .route("/api/v1/media", post(MediaController::upload_media))
        .route("/api/v1/media/{id}", get(MediaController::get_media));

    Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_upload_bytes))
        .layer(cors_layer(server))
        .with_state(app_state)
}
