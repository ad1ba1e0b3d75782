//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs one full collection against the cluster and returns the
//! array samples followed by the exporter's own metrics in Prometheus text
//! format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use netapp_ontap_exporter::exposition::{encode_text, series_count, to_families};
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::state::{LastScrape, SharedState};

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    if state.exporter.is_collecting() {
        debug!("Another scrape is still running, starting a concurrent one");
    }

    let scrape = state.exporter.collect().await;
    let summary = &scrape.summary;

    for report in summary.reports.iter().filter(|r| !r.is_success()) {
        warn!(
            collector = report.collector,
            errors = report.errors.len(),
            "Collector finished with errors: {}",
            report.errors.join("; ")
        );
    }

    let mut families = to_families(&scrape.samples);
    let exported = series_count(&families);

    state.telemetry.observe(summary, exported);
    *state.last_scrape.write().await = Some(LastScrape::from_summary(summary));

    families.extend(state.telemetry.registry.gather());

    let body = encode_text(&families).map_err(|e| {
        error!("Failed to encode Prometheus metrics: {}", e);
        MetricsError::EncodingFailed
    })?;

    debug!(
        "Metrics request completed: {} series, {} bytes, {:.3}ms",
        exported,
        body.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(body)
}
