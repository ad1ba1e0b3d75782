//! Root endpoint handler.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, instrument};

/// Handler for the root `/` endpoint: 301 redirect to `/metrics`.
///
/// `axum::response::Redirect::permanent` answers 308, which some older
/// scrapers do not follow.
#[instrument]
pub async fn root_handler() -> impl IntoResponse {
    debug!("Processing / request");
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/metrics")],
    )
}
