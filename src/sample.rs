//! Metric identities produced by the collectors.
//!
//! A [`Sample`] is a fully-built, immutable time-series point: namespaced name,
//! help text, label set, value kind and value. Collectors build samples with
//! the helpers in this module and hand them straight to the output stream.

use std::collections::BTreeMap;

/// Prefix shared by every metric coming from the array.
pub const NAMESPACE: &str = "netapp_ontap";

/// Disk counter that keeps its `disk_` prefix.
pub const DISK_BUSY_BASE_COUNTER: &str = "base_for_disk_busy";

// Label names
pub const LABEL_DISK: &str = "disk";
pub const LABEL_VOLUME: &str = "volume";
pub const LABEL_AGGR: &str = "aggr";
pub const LABEL_CLUSTER: &str = "cluster";

/// Ordered label set with unique keys.
pub type Labels = BTreeMap<&'static str, String>;

/// Prometheus value type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// One metric identity with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub help: String,
    pub labels: Labels,
    pub kind: MetricKind,
    pub value: f64,
}

impl Sample {
    /// Builds a sample named `<NAMESPACE>_<fragment>`.
    pub fn new(
        fragment: &str,
        help: impl Into<String>,
        labels: Labels,
        kind: MetricKind,
        value: f64,
    ) -> Self {
        Self {
            name: qualified_name(fragment),
            help: help.into(),
            labels,
            kind,
            value,
        }
    }

    pub fn gauge(fragment: &str, help: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self::new(fragment, help, labels, MetricKind::Gauge, value)
    }

    pub fn counter(fragment: &str, help: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self::new(fragment, help, labels, MetricKind::Counter, value)
    }

    /// Label value by name, if present.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Label names in exposition order.
    pub fn label_names(&self) -> Vec<&'static str> {
        self.labels.keys().copied().collect()
    }
}

pub fn qualified_name(fragment: &str) -> String {
    format!("{}_{}", NAMESPACE, fragment)
}

/// Name fragment and help text for a disk performance counter.
///
/// `base_for_disk_busy` is exported as `disk_base_for_disk_busy`; every other
/// disk counter is exported under its bare counter name.
pub fn disk_counter_identity(counter: &str) -> (String, &'static str) {
    if counter == DISK_BUSY_BASE_COUNTER {
        (format!("disk_{}", counter), "Disk busy base counter")
    } else {
        (counter.to_string(), "Disk busy counter")
    }
}

pub fn disk_labels(disk: &str, cluster: &str) -> Labels {
    Labels::from([
        (LABEL_DISK, disk.to_string()),
        (LABEL_CLUSTER, cluster.to_string()),
    ])
}

pub fn volume_labels(volume: &str, aggr: &str, cluster: &str) -> Labels {
    Labels::from([
        (LABEL_VOLUME, volume.to_string()),
        (LABEL_AGGR, aggr.to_string()),
        (LABEL_CLUSTER, cluster.to_string()),
    ])
}

pub fn aggr_labels(aggr: &str, cluster: &str) -> Labels {
    Labels::from([
        (LABEL_AGGR, aggr.to_string()),
        (LABEL_CLUSTER, cluster.to_string()),
    ])
}

/// Static shape of a metric, as reported by `describe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub label_names: Vec<&'static str>,
    pub kind: &'static str,
}

impl From<&Sample> for MetricDescriptor {
    fn from(sample: &Sample) -> Self {
        Self {
            name: sample.name.clone(),
            help: sample.help.clone(),
            label_names: sample.label_names(),
            kind: sample.kind.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_base_counter_keeps_disk_prefix() {
        let (fragment, help) = disk_counter_identity("base_for_disk_busy");
        assert_eq!(qualified_name(&fragment), "netapp_ontap_disk_base_for_disk_busy");
        assert_eq!(help, "Disk busy base counter");
    }

    #[test]
    fn test_other_disk_counters_have_no_disk_prefix() {
        for counter in ["disk_busy", "total_transfers", "user_read_blocks"] {
            let (fragment, help) = disk_counter_identity(counter);
            assert_eq!(qualified_name(&fragment), format!("netapp_ontap_{}", counter));
            assert_eq!(help, "Disk busy counter");
        }
    }

    #[test]
    fn test_labels_are_ordered_and_unique() {
        let labels = volume_labels("vol1", "aggr1", "c1");
        let names: Vec<_> = labels.keys().copied().collect();
        assert_eq!(names, vec!["aggr", "cluster", "volume"]);

        let sample = Sample::counter("volume_read_ops", "Volume Performance counter", labels, 3.0);
        assert_eq!(sample.name, "netapp_ontap_volume_read_ops");
        assert_eq!(sample.label("aggr"), Some("aggr1"));
        assert_eq!(sample.kind, MetricKind::Counter);
    }

    #[test]
    fn test_descriptor_from_sample() {
        let sample = Sample::gauge("disk_online", "Disk Online Status", disk_labels("d1", ""), 1.0);
        let desc = MetricDescriptor::from(&sample);
        assert_eq!(desc.name, "netapp_ontap_disk_online");
        assert_eq!(desc.label_names, vec!["cluster", "disk"]);
        assert_eq!(desc.kind, "gauge");
    }
}
