//! Scrape entry point handed to the HTTP layer.
//!
//! The [`Exporter`] is built once at startup around an [`Orchestrator`] and
//! passed explicitly to whoever serves `/metrics`. It offers the two calls a
//! pull-based monitoring system needs: `describe` and `collect`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::sample::{MetricDescriptor, Sample};
use crate::scrape::{Orchestrator, ScrapeSummary};

/// Samples and reports of one finished scrape.
#[derive(Debug, Clone, Default)]
pub struct Scrape {
    pub samples: Vec<Sample>,
    pub summary: ScrapeSummary,
}

pub struct Exporter {
    orchestrator: Arc<Orchestrator>,
    in_flight: AtomicUsize,
}

impl Exporter {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Runs one collection and returns every sample it produced.
    pub async fn collect(&self) -> Scrape {
        let _guard = InFlight::enter(&self.in_flight);
        let (samples, summary) = self.orchestrator.run().await.collect_all().await;
        Scrape { samples, summary }
    }

    /// Shapes of the metrics this source currently produces.
    ///
    /// The metric set depends on what the array reports, so this runs a real
    /// collection and keeps the distinct descriptors.
    pub async fn describe(&self) -> Vec<MetricDescriptor> {
        let scrape = self.collect().await;
        let descriptors: BTreeSet<MetricDescriptor> =
            scrape.samples.iter().map(MetricDescriptor::from).collect();
        debug!("Described {} metrics", descriptors.len());
        descriptors.into_iter().collect()
    }

    /// Whether a collection is currently running.
    pub fn is_collecting(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed) > 0
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontap::{DiskInfo, FixtureConnector, FixtureData, PerfCounter};
    use crate::scrape::ScrapeOptions;

    fn exporter() -> Exporter {
        let data = FixtureData {
            cluster_name: "c1".into(),
            disk_perf: vec![
                PerfCounter::new("disk1", "disk_busy", "1"),
                PerfCounter::new("disk2", "disk_busy", "2"),
            ],
            disk_info: vec![DiskInfo {
                name: "disk1".into(),
                online: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(
            Arc::new(FixtureConnector::new(data)),
            ScrapeOptions::default(),
        );
        Exporter::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    async fn test_describe_deduplicates_shapes() {
        let exporter = exporter();
        let descriptors = exporter.describe().await;
        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "netapp_ontap_disk_busy",
                "netapp_ontap_disk_online",
                "netapp_ontap_disk_prefailed",
                "netapp_ontap_disk_spare",
            ]
        );
        assert!(!exporter.is_collecting());
    }

    #[tokio::test]
    async fn test_collect_returns_to_idle() {
        let exporter = exporter();
        let scrape = exporter.collect().await;
        assert_eq!(scrape.samples.len(), 5);
        assert_eq!(scrape.summary.cluster, "c1");
        assert!(!exporter.is_collecting());
    }
}
