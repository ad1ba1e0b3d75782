//! Per-scrape collection orchestration.
//!
//! One [`Orchestrator::run`] call is one scrape: the cluster name is resolved
//! on its own connection, every collector is spawned as a tokio task writing to
//! a shared unbounded channel, and the channel closes once all of them have
//! finished.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, instrument, warn};

use crate::collectors::{
    default_collectors, run_collector, CollectorReport, ResourceCollector, ScrapeContext,
    DEFAULT_VOLUME_MAX_RECORDS,
};
use crate::ontap::Connector;
use crate::sample::Sample;

/// Scrape-wide settings fixed at startup.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub volume_max_records: usize,
    pub collector_timeout: Option<Duration>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            volume_max_records: DEFAULT_VOLUME_MAX_RECORDS,
            collector_timeout: None,
        }
    }
}

/// Summary of one finished scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    pub cluster: String,
    pub reports: Vec<CollectorReport>,
    pub duration: Duration,
}

impl ScrapeSummary {
    pub fn samples(&self) -> usize {
        self.reports.iter().map(|r| r.samples).sum()
    }

    pub fn failed_collectors(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_success()).count()
    }
}

/// Output of one scrape: the sample stream plus its completion barrier.
pub struct ScrapeStream {
    rx: UnboundedReceiver<Sample>,
    done: JoinHandle<ScrapeSummary>,
}

impl ScrapeStream {
    /// Next sample, or `None` once every collector has finished.
    pub async fn recv(&mut self) -> Option<Sample> {
        self.rx.recv().await
    }

    /// Waits for the barrier and returns the per-collector reports.
    pub async fn finish(self) -> ScrapeSummary {
        drop(self.rx);
        match self.done.await {
            Ok(summary) => summary,
            Err(e) => {
                error!("Scrape barrier task failed: {}", e);
                ScrapeSummary::default()
            }
        }
    }

    /// Drains the stream and waits for completion.
    pub async fn collect_all(mut self) -> (Vec<Sample>, ScrapeSummary) {
        let mut samples = Vec::new();
        while let Some(sample) = self.recv().await {
            samples.push(sample);
        }
        let summary = self.finish().await;
        (samples, summary)
    }
}

/// Runs the collectors for one scrape.
pub struct Orchestrator {
    connector: Arc<dyn Connector>,
    collectors: Vec<Arc<dyn ResourceCollector>>,
    options: ScrapeOptions,
}

impl Orchestrator {
    /// Orchestrator over the disk, volume and aggregate collectors.
    pub fn new(connector: Arc<dyn Connector>, options: ScrapeOptions) -> Self {
        Self::with_collectors(connector, default_collectors(), options)
    }

    pub fn with_collectors(
        connector: Arc<dyn Connector>,
        collectors: Vec<Arc<dyn ResourceCollector>>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            connector,
            collectors,
            options,
        }
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Resolves the cluster name on a dedicated connection, `""` on failure.
    async fn resolve_cluster(&self) -> String {
        let api = match self.connector.connect() {
            Ok(api) => api,
            Err(e) => {
                warn!("Cannot connect for cluster identity: {}", e);
                return String::new();
            }
        };
        match api.cluster_identity().await {
            Ok(identity) => identity.cluster_name,
            Err(e) => {
                warn!("Cluster identity lookup failed: {}", e);
                String::new()
            }
        }
    }

    /// Starts one scrape and returns its sample stream.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ScrapeStream {
        let start = Instant::now();
        let cluster = self.resolve_cluster().await;
        let ctx = Arc::new(ScrapeContext {
            cluster: cluster.clone(),
            volume_max_records: self.options.volume_max_records,
            collector_timeout: self.options.collector_timeout,
        });

        let (tx, rx) = unbounded_channel();
        let mut tasks = JoinSet::new();
        for collector in &self.collectors {
            let collector = Arc::clone(collector);
            let connector = Arc::clone(&self.connector);
            let ctx = Arc::clone(&ctx);
            let tx = tx.clone();
            tasks.spawn(async move {
                run_collector(collector.as_ref(), connector.as_ref(), &ctx, tx).await
            });
        }
        // Only the collector tasks hold senders now
        drop(tx);

        let done = tokio::spawn(async move {
            let mut reports = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(report) => reports.push(report),
                    Err(e) => error!("Collector task failed: {}", e),
                }
            }
            let summary = ScrapeSummary {
                cluster,
                reports,
                duration: start.elapsed(),
            };
            info!(
                cluster = %summary.cluster,
                samples = summary.samples(),
                failed_collectors = summary.failed_collectors(),
                "Total Time: {:.3}s",
                summary.duration.as_secs_f64()
            );
            summary
        });

        ScrapeStream { rx, done }
    }
}
