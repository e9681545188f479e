// Request logging middleware
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Log every request with a short id, its final status and latency.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    tracing::info!("[{}] Request: {} {}", request_id, method, uri);

    let response = next.run(request).await;

    tracing::info!(
        "[{}] Response: {} {} -> {} ({} ms)",
        request_id,
        method,
        uri.path(),
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    response
}
