//! Exporter self-metrics.
//!
//! These live in a regular `prometheus::Registry` owned by the application
//! state and are appended after the array samples on every `/metrics` call.

use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};

use crate::scrape::ScrapeSummary;

/// Build information embedded at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

#[derive(Clone)]
pub struct ExporterMetrics {
    pub registry: Registry,
    pub build_info: GaugeVec,
    pub scrape_duration: Gauge,
    pub scrapes_total: Counter,
    pub samples: Gauge,
    pub collector_duration: GaugeVec,
    pub collector_errors_total: CounterVec,
}

impl ExporterMetrics {
    /// Creates and registers all self-metrics with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let build_info = GaugeVec::new(
            Opts::new(
                "netapp_exporter_build_info",
                "A metric with a constant '1' value labeled by version and git commit",
            ),
            &["version", "git_sha"],
        )?;
        let scrape_duration = Gauge::new(
            "netapp_exporter_scrape_duration_seconds",
            "Time spent collecting metrics from the array in the last scrape",
        )?;
        let scrapes_total = Counter::new(
            "netapp_exporter_scrapes_total",
            "Total number of scrapes served",
        )?;
        let samples = Gauge::new(
            "netapp_exporter_samples",
            "Number of array series exported by the last scrape after dropping duplicates",
        )?;
        let collector_duration = GaugeVec::new(
            Opts::new(
                "netapp_exporter_collector_duration_seconds",
                "Time spent in each collector during the last scrape",
            ),
            &["collector"],
        )?;
        let collector_errors_total = CounterVec::new(
            Opts::new(
                "netapp_exporter_collector_errors_total",
                "Total number of failed backend fetches per collector",
            ),
            &["collector"],
        )?;

        registry.register(Box::new(build_info.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(samples.clone()))?;
        registry.register(Box::new(collector_duration.clone()))?;
        registry.register(Box::new(collector_errors_total.clone()))?;

        build_info.with_label_values(&[VERSION, GIT_SHA]).set(1.0);

        Ok(Self {
            registry,
            build_info,
            scrape_duration,
            scrapes_total,
            samples,
            collector_duration,
            collector_errors_total,
        })
    }

    /// Records the outcome of one scrape.
    ///
    /// `exported` is the series count actually written out, which is lower than
    /// `summary.samples()` when duplicates were dropped.
    pub fn observe(&self, summary: &ScrapeSummary, exported: usize) {
        self.scrapes_total.inc();
        self.scrape_duration.set(summary.duration.as_secs_f64());
        self.samples.set(exported as f64);
        for report in &summary.reports {
            self.collector_duration
                .with_label_values(&[report.collector])
                .set(report.duration.as_secs_f64());
            // inc_by(0) still creates the series
            self.collector_errors_total
                .with_label_values(&[report.collector])
                .inc_by(report.errors.len() as f64);
        }
    }
}
