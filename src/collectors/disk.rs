//! Disk performance counters and disk state.

use async_trait::async_trait;

use super::{Emitter, ResourceCollector, ScrapeContext};
use crate::coerce::{flag, to_f64};
use crate::ontap::{DiskInfo, OntapApi, PerfCounter};
use crate::sample::{disk_counter_identity, disk_labels, Sample};

pub struct DiskCollector;

/// Gauge for one disk performance counter.
pub fn perf_sample(counter: &PerfCounter, cluster: &str) -> Sample {
    let (fragment, help) = disk_counter_identity(&counter.counter);
    Sample::gauge(
        &fragment,
        help,
        disk_labels(&counter.object_name, cluster),
        to_f64(&counter.value),
    )
}

/// Online, spare and prefailed gauges for one disk.
pub fn state_samples(disk: &DiskInfo, cluster: &str) -> [Sample; 3] {
    [
        Sample::gauge(
            "disk_online",
            "Disk Online Status",
            disk_labels(&disk.name, cluster),
            flag(disk.online),
        ),
        Sample::gauge(
            "disk_spare",
            "Disk Spare Status. 1 == Spare Disk",
            disk_labels(&disk.name, cluster),
            flag(disk.spare),
        ),
        Sample::gauge(
            "disk_prefailed",
            "Disk Prefailed Status. 1 == Failed",
            disk_labels(&disk.name, cluster),
            flag(disk.prefailed),
        ),
    ]
}

#[async_trait]
impl ResourceCollector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
    }

    async fn collect(&self, api: &dyn OntapApi, ctx: &ScrapeContext, out: &mut Emitter) {
        match api.disk_perf().await {
            Ok(counters) => {
                for counter in &counters {
                    out.emit(perf_sample(counter, &ctx.cluster));
                }
            }
            Err(e) => out.fetch_failed("disk performance", &e),
        }

        match api.disk_info().await {
            Ok(disks) => {
                for disk in &disks {
                    for sample in state_samples(disk, &ctx.cluster) {
                        out.emit(sample);
                    }
                }
            }
            Err(e) => out.fetch_failed("disk info", &e),
        }
    }
}
