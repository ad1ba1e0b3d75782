//! Volume performance counters, state and space usage.
//!
//! The performance table and the info endpoint report the owning aggregate
//! differently, so a volume→aggregate map is fetched first and used to give
//! every volume sample the same `aggr` label.

use async_trait::async_trait;

use super::{Emitter, ResourceCollector, ScrapeContext};
use crate::coerce::{flag, to_f64};
use crate::ontap::{OntapApi, PerfCounter, VolumeAggrMap, VolumeInfo};
use crate::sample::{volume_labels, Sample};

pub struct VolumeCollector;

/// Counter for one volume performance reading.
pub fn perf_sample(counter: &PerfCounter, aggr_map: &VolumeAggrMap, cluster: &str) -> Sample {
    let aggr = aggr_map
        .get(&counter.object_name)
        .map(String::as_str)
        .unwrap_or("");
    Sample::counter(
        &format!("volume_{}", counter.counter),
        "Volume Performance counter",
        volume_labels(&counter.object_name, aggr, cluster),
        to_f64(&counter.value),
    )
}

/// State and space gauges for one volume.
pub fn info_samples(volume: &VolumeInfo, aggr_map: &VolumeAggrMap, cluster: &str) -> Vec<Sample> {
    let aggr = if volume.aggr.is_empty() {
        aggr_map.get(&volume.name).map(String::as_str).unwrap_or("")
    } else {
        volume.aggr.as_str()
    };
    let labels = || volume_labels(&volume.name, aggr, cluster);
    let online = volume.state.eq_ignore_ascii_case("online");

    vec![
        Sample::gauge("volume_state", "Volume State. 1 == Online", labels(), flag(online)),
        Sample::gauge("volume_size_total", "Volume size total", labels(), to_f64(&volume.size_total)),
        Sample::gauge("volume_size_used", "Volume size used", labels(), to_f64(&volume.size_used)),
        Sample::gauge("volume_size_free", "Volume size free", labels(), to_f64(&volume.size_free)),
        Sample::gauge(
            "volume_snap_used",
            "Volume percent used snapshot",
            labels(),
            to_f64(&volume.snap_percent_used),
        ),
        Sample::gauge(
            "volume_snap_reserved",
            "Volume percent reserved snapshot",
            labels(),
            to_f64(&volume.snap_percent_reserve),
        ),
    ]
}

#[async_trait]
impl ResourceCollector for VolumeCollector {
    fn name(&self) -> &'static str {
        "volume"
    }

    async fn collect(&self, api: &dyn OntapApi, ctx: &ScrapeContext, out: &mut Emitter) {
        let aggr_map = match api.volume_to_aggr_map().await {
            Ok(map) => map,
            Err(e) => {
                out.fetch_failed("volume to aggregate map", &e);
                VolumeAggrMap::new()
            }
        };

        match api.volume_perf().await {
            Ok(counters) => {
                for counter in &counters {
                    out.emit(perf_sample(counter, &aggr_map, &ctx.cluster));
                }
            }
            Err(e) => out.fetch_failed("volume performance", &e),
        }

        match api.volume_info(ctx.volume_max_records).await {
            Ok(volumes) => {
                for volume in &volumes {
                    for sample in info_samples(volume, &aggr_map, &ctx.cluster) {
                        out.emit(sample);
                    }
                }
            }
            Err(e) => out.fetch_failed("volume info", &e),
        }
    }
}
