//! Request logging middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, error, warn};

/// Log each request with its outcome and latency.
///
/// Successes log at debug, client errors at warn, server errors at error.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        error!(%method, %uri, %status, ?duration, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %uri, %status, ?duration, "Request rejected");
    } else {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    }

    response
}
