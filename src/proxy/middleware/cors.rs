// CORS layer for browser clients

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::error::{AppError, AppResult};

/// Build the CORS layer for the configured origin.
/// Preflight requests are answered here and never reach the handler.
pub fn cors_layer(allowed_origin: &str) -> AppResult<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| AppError::Config(format!("Invalid CORS origin {}: {}", allowed_origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ]))
}
