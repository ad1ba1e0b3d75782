//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use chrono::{DateTime, Utc};
use netapp_ontap_exporter::{Exporter, ExporterMetrics, ScrapeSummary};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Outcome of the most recent `/metrics` scrape, reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct LastScrape {
    pub finished_at: DateTime<Utc>,
    pub cluster: String,
    pub duration_seconds: f64,
    pub samples: usize,
    pub failed_collectors: Vec<&'static str>,
}

impl LastScrape {
    pub fn from_summary(summary: &ScrapeSummary) -> Self {
        Self {
            finished_at: Utc::now(),
            cluster: summary.cluster.clone(),
            duration_seconds: summary.duration.as_secs_f64(),
            samples: summary.samples(),
            failed_collectors: summary
                .reports
                .iter()
                .filter(|r| !r.is_success())
                .map(|r| r.collector)
                .collect(),
        }
    }
}

/// Global application state shared across requests.
pub struct AppState {
    pub exporter: Arc<Exporter>,
    pub telemetry: ExporterMetrics,
    pub last_scrape: RwLock<Option<LastScrape>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
