//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports uptime and
//! the outcome of the most recent scrape as JSON.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::{LastScrape, SharedState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub scrape_in_progress: bool,
    pub last_scrape: Option<LastScrape>,
}

/// Handler for the /health endpoint.
///
/// Answers 200 unless the last scrape had every collector fail, in which case
/// the cluster is most likely unreachable and 503 is returned.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let last_scrape = state.last_scrape.read().await.clone();
    let collectors = state.exporter.orchestrator().collector_names().len();

    let (status_code, status) = match &last_scrape {
        None => (StatusCode::OK, "starting"),
        Some(last) if collectors > 0 && last.failed_collectors.len() == collectors => {
            (StatusCode::SERVICE_UNAVAILABLE, "failing")
        }
        Some(last) if !last.failed_collectors.is_empty() => (StatusCode::OK, "degraded"),
        Some(_) => (StatusCode::OK, "ok"),
    };

    debug!("Health check: {} - {}", status_code, status);
    (
        status_code,
        Json(HealthResponse {
            status,
            version: netapp_ontap_exporter::telemetry::VERSION,
            uptime_seconds: state.start_time.elapsed().as_secs(),
            scrape_in_progress: state.exporter.is_collecting(),
            last_scrape,
        }),
    )
}
