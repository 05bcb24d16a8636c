use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::domain::config::secrets::Secrets;

pub const ADMIN_SECRET_HEADER: &str = "X-Admin-Secret";

/// Middleware to validate the X-Admin-Secret header
pub async fn validate_admin_secret(
    State(secrets): State<Arc<Secrets>>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Response {
    match headers.get(ADMIN_SECRET_HEADER) {
        Some(header_value) => match header_value.to_str() {
            Ok(provided_secret) if provided_secret == secrets.app_secret => {
                next.run(request).await
            }
            Ok(_) => {
                warn!("Invalid secret provided in {} header", ADMIN_SECRET_HEADER);
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            Err(_) => {
                warn!("{} header contains invalid UTF-8", ADMIN_SECRET_HEADER);
                (StatusCode::BAD_REQUEST, "Bad request").into_response()
            }
        },
        None => {
            warn!("{} header is missing", ADMIN_SECRET_HEADER);
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}
