//! NetApp ONTAP Prometheus Exporter Library
//!
//! This library queries a NetApp ONTAP cluster for disk, volume and aggregate
//! statistics and turns them into Prometheus samples. It is framework-agnostic:
//! the binary wires the [`Exporter`] into an axum server, but any HTTP layer
//! can call [`Exporter::collect`] and render the result with [`exposition`].
//!
//! # Features
//!
//! - **Concurrent collection**: disk, volume and aggregate collectors run in parallel
//! - **Fault isolation**: a failing endpoint only removes its own samples
//! - **Canned data**: [`FixtureConnector`] serves a YAML/JSON file instead of a cluster
//!
//! # Usage
//!
//! ```rust
//! use netapp_ontap_exporter::{
//!     exposition, Exporter, FixtureConnector, FixtureData, Orchestrator, PerfCounter,
//!     ScrapeOptions,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let data = FixtureData {
//!     cluster_name: "cluster1".into(),
//!     disk_perf: vec![PerfCounter::new("1.0.1", "disk_busy", "42")],
//!     ..Default::default()
//! };
//! let orchestrator = Orchestrator::new(
//!     Arc::new(FixtureConnector::new(data)),
//!     ScrapeOptions::default(),
//! );
//! let exporter = Exporter::new(Arc::new(orchestrator));
//!
//! let scrape = exporter.collect().await;
//! let text = exposition::encode_text(&exposition::to_families(&scrape.samples)).unwrap();
//! assert!(text.contains(r#"netapp_ontap_disk_busy{cluster="cluster1",disk="1.0.1"} 42"#));
//! # });
//! ```

pub mod cli;
pub mod coerce;
pub mod collectors;
pub mod config;
pub mod exporter;
pub mod exposition;
pub mod ontap;
pub mod sample;
pub mod scrape;
pub mod telemetry;

// Re-export main types for convenience
pub use collectors::{CollectorReport, ResourceCollector, ScrapeContext};
pub use config::{Config, ConfigError};
pub use exporter::{Exporter, Scrape};
pub use ontap::{
    Connector, DiskInfo, FixtureConnector, FixtureData, OntapApi, OntapError, PerfCounter,
    RestConnector, VolumeInfo,
};
pub use sample::{MetricDescriptor, MetricKind, Sample};
pub use scrape::{Orchestrator, ScrapeOptions, ScrapeSummary};
pub use telemetry::ExporterMetrics;
