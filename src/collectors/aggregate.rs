//! Aggregate performance counters.

use async_trait::async_trait;

use super::{Emitter, ResourceCollector, ScrapeContext};
use crate::coerce::to_f64;
use crate::ontap::{OntapApi, PerfCounter};
use crate::sample::{aggr_labels, Sample};

pub struct AggregateCollector;

pub fn perf_sample(counter: &PerfCounter, cluster: &str) -> Sample {
    Sample::counter(
        &format!("aggr_{}", counter.counter),
        format!("Aggregate Performance counter {}", counter.counter),
        aggr_labels(&counter.object_name, cluster),
        to_f64(&counter.value),
    )
}

#[async_trait]
impl ResourceCollector for AggregateCollector {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    async fn collect(&self, api: &dyn OntapApi, ctx: &ScrapeContext, out: &mut Emitter) {
        let counters = match api.aggr_perf().await {
            Ok(counters) => counters,
            Err(e) => {
                out.fetch_failed("aggregate performance", &e);
                return;
            }
        };

        for counter in &counters {
            out.emit(perf_sample(counter, &ctx.cluster));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::run_collector;
    use crate::ontap::{Endpoint, FixtureConnector, FixtureData};
    use crate::sample::MetricKind;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_perf_sample() {
        let sample = perf_sample(&PerfCounter::new("aggr1", "total_transfers", "99"), "c1");
        assert_eq!(sample.name, "netapp_ontap_aggr_total_transfers");
        assert_eq!(sample.help, "Aggregate Performance counter total_transfers");
        assert_eq!(sample.kind, MetricKind::Counter);
        assert_eq!(sample.label("aggr"), Some("aggr1"));
        assert_eq!(sample.label("cluster"), Some("c1"));
        assert_eq!(sample.value, 99.0);
    }

    #[tokio::test]
    async fn test_fetch_failure_emits_nothing() {
        let data = FixtureData {
            aggr_perf: vec![PerfCounter::new("aggr1", "total_transfers", "99")],
            ..Default::default()
        }
        .failing(Endpoint::AggrPerf);
        let (tx, mut rx) = unbounded_channel();
        let report = run_collector(
            &AggregateCollector,
            &FixtureConnector::new(data),
            &ScrapeContext::new(""),
            tx,
        )
        .await;

        assert_eq!(report.samples, 0);
        assert!(!report.is_success());
        assert!(rx.recv().await.is_none());
    }
}
