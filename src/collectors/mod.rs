//! Resource collectors for ONTAP metrics.
//!
//! Each collector owns one resource family (disks, volumes, aggregates). It
//! opens its own backend client, fetches its result sets and streams every
//! sample onto the shared output channel as soon as it is built.
//!
//! Fetch failures are non-fatal: they are logged, recorded in the
//! [`CollectorReport`], and the collector moves on to whatever else it can
//! still fetch.

pub mod aggregate;
pub mod disk;
pub mod volume;

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::ontap::{Connector, OntapApi, OntapError};
use crate::sample::Sample;

pub use aggregate::AggregateCollector;
pub use disk::DiskCollector;
pub use volume::VolumeCollector;

/// Default number of volumes requested from the volume info endpoint.
pub const DEFAULT_VOLUME_MAX_RECORDS: usize = 100;

/// Sending half of the per-scrape output stream.
pub type SampleSender = UnboundedSender<Sample>;

/// Read-only context shared by all collectors of one scrape.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    /// Cluster name, empty when it could not be resolved.
    pub cluster: String,
    pub volume_max_records: usize,
    /// Upper bound on one collector's fetch work, `None` for no limit.
    pub collector_timeout: Option<Duration>,
}

impl ScrapeContext {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            volume_max_records: DEFAULT_VOLUME_MAX_RECORDS,
            collector_timeout: None,
        }
    }
}

/// Outcome of one collector run.
#[derive(Debug, Clone, Default)]
pub struct CollectorReport {
    pub collector: &'static str,
    pub samples: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl CollectorReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Streams samples for one collector and records its fetch failures.
pub struct Emitter {
    collector: &'static str,
    tx: SampleSender,
    samples: usize,
    errors: Vec<String>,
}

impl Emitter {
    pub fn new(collector: &'static str, tx: SampleSender) -> Self {
        Self {
            collector,
            tx,
            samples: 0,
            errors: Vec::new(),
        }
    }

    /// Sends `sample` to the output stream.
    pub fn emit(&mut self, sample: Sample) {
        // A closed stream means the consumer went away; nothing left to do.
        if self.tx.send(sample).is_ok() {
            self.samples += 1;
        }
    }

    /// Logs and records a failed fetch of `what`.
    pub fn fetch_failed(&mut self, what: &str, err: &OntapError) {
        warn!(collector = self.collector, "Failed to fetch {}: {}", what, err);
        self.errors.push(format!("{}: {}", what, err));
    }

    fn timed_out(&mut self, limit: Duration) {
        warn!(
            collector = self.collector,
            "Collector timed out after {}s, keeping {} samples already sent",
            limit.as_secs_f64(),
            self.samples
        );
        self.errors
            .push(format!("timed out after {}s", limit.as_secs_f64()));
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    fn into_report(self, duration: Duration) -> CollectorReport {
        CollectorReport {
            collector: self.collector,
            samples: self.samples,
            errors: self.errors,
            duration,
        }
    }
}

/// A unit of work that turns one resource family into samples.
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches data through `api` and emits samples. Must not fail the scrape.
    async fn collect(&self, api: &dyn OntapApi, ctx: &ScrapeContext, out: &mut Emitter);
}

/// The standard collector set: disk, volume, aggregate.
pub fn default_collectors() -> Vec<std::sync::Arc<dyn ResourceCollector>> {
    vec![
        std::sync::Arc::new(DiskCollector),
        std::sync::Arc::new(VolumeCollector),
        std::sync::Arc::new(AggregateCollector),
    ]
}

/// Opens a dedicated client and runs `collector` to completion.
///
/// Always returns a report; a connection failure or a timeout is recorded like
/// any other fetch failure.
pub async fn run_collector(
    collector: &dyn ResourceCollector,
    connector: &dyn Connector,
    ctx: &ScrapeContext,
    tx: SampleSender,
) -> CollectorReport {
    let start = Instant::now();
    let mut out = Emitter::new(collector.name(), tx);

    match connector.connect() {
        Ok(api) => {
            let work = collector.collect(api.as_ref(), ctx, &mut out);
            match ctx.collector_timeout {
                Some(limit) => {
                    if tokio::time::timeout(limit, work).await.is_err() {
                        out.timed_out(limit);
                    }
                }
                None => work.await,
            }
        }
        Err(e) => out.fetch_failed("connection", &e),
    }

    let report = out.into_report(start.elapsed());
    debug!(
        collector = report.collector,
        samples = report.samples,
        errors = report.errors.len(),
        "Collector finished in {:.3}s",
        report.duration.as_secs_f64()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontap::{Endpoint, FixtureConnector, FixtureData};
    use crate::sample::disk_labels;
    use tokio::sync::mpsc::unbounded_channel;

    struct FailingConnector;

    impl Connector for FailingConnector {
        fn connect(&self) -> Result<Box<dyn OntapApi>, OntapError> {
            Err(OntapError::Client("no route to host".into()))
        }
    }

    #[test]
    fn test_emitter_counts_only_delivered_samples() {
        let (tx, rx) = unbounded_channel();
        let mut out = Emitter::new("disk", tx);
        out.emit(Sample::gauge("disk_online", "Disk Online Status", disk_labels("d1", ""), 1.0));
        drop(rx);
        out.emit(Sample::gauge("disk_online", "Disk Online Status", disk_labels("d2", ""), 1.0));
        assert_eq!(out.samples(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_still_reports() {
        let (tx, mut rx) = unbounded_channel();
        let report = run_collector(&DiskCollector, &FailingConnector, &ScrapeContext::new("c1"), tx).await;

        assert_eq!(report.collector, "disk");
        assert_eq!(report.samples, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("connection"));
        // Sender dropped with the report: stream is closed
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_each_run_opens_its_own_client() {
        let connector = FixtureConnector::new(FixtureData::default().failing(Endpoint::AggrPerf));
        let ctx = ScrapeContext::new("");
        for collector in default_collectors() {
            let (tx, _rx) = unbounded_channel();
            run_collector(collector.as_ref(), &connector, &ctx, tx).await;
        }
        assert_eq!(connector.connections(), 3);
    }
}
