//! Conversion of scraped samples into Prometheus metric families.

use ahash::AHashSet as HashSet;
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};
use std::collections::BTreeMap;
use tracing::warn;

use crate::sample::{MetricKind, Sample};

fn to_metric(sample: &Sample) -> Metric {
    let labels = sample
        .labels
        .iter()
        .map(|(name, value)| {
            let mut pair = LabelPair::default();
            pair.set_name(name.to_string());
            pair.set_value(value.clone());
            pair
        })
        .collect();

    let mut metric = Metric::default();
    metric.set_label(labels);
    match sample.kind {
        MetricKind::Gauge => {
            let mut g = Gauge::default();
            g.set_value(sample.value);
            metric.set_gauge(g);
        }
        MetricKind::Counter => {
            let mut c = Counter::default();
            c.set_value(sample.value);
            metric.set_counter(c);
        }
    }
    metric
}

/// Groups samples into families sorted by name.
///
/// A repeated (name, label set) would be rejected by Prometheus, so only the
/// first occurrence is kept. A sample whose kind disagrees with the first one
/// seen for its name is dropped for the same reason.
pub fn to_families(samples: &[Sample]) -> Vec<MetricFamily> {
    let mut families: BTreeMap<&str, (MetricFamily, MetricKind)> = BTreeMap::new();
    let mut seen: HashSet<(&str, Vec<(&str, &str)>)> = HashSet::new();

    for sample in samples {
        let key = (
            sample.name.as_str(),
            sample
                .labels
                .iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect::<Vec<_>>(),
        );
        if !seen.insert(key) {
            warn!(metric = %sample.name, labels = ?sample.labels, "Dropping duplicate sample");
            continue;
        }

        let (family, kind) = families.entry(sample.name.as_str()).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(sample.name.clone());
            family.set_help(sample.help.clone());
            family.set_field_type(match sample.kind {
                MetricKind::Gauge => MetricType::GAUGE,
                MetricKind::Counter => MetricType::COUNTER,
            });
            (family, sample.kind)
        });
        if *kind != sample.kind {
            warn!(metric = %sample.name, "Dropping sample with conflicting metric type");
            continue;
        }
        family.mut_metric().push(to_metric(sample));
    }

    families.into_values().map(|(family, _)| family).collect()
}

/// Number of series across `families`.
#[allow(deprecated)]
pub fn series_count(families: &[MetricFamily]) -> usize {
    families.iter().map(|f| f.get_metric().len()).sum()
}

/// Renders families in the Prometheus text format.
pub fn encode_text(families: &[MetricFamily]) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::sample::{aggr_labels, disk_labels};

    #[test]
    fn test_groups_by_name() {
        let samples = vec![
            Sample::gauge("disk_online", "Disk Online Status", disk_labels("d2", "c1"), 0.0),
            Sample::counter("aggr_total_transfers", "Aggregate Performance counter total_transfers", aggr_labels("a1", "c1"), 5.0),
            Sample::gauge("disk_online", "Disk Online Status", disk_labels("d1", "c1"), 1.0),
        ];
        let families = to_families(&samples);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].name(), "netapp_ontap_aggr_total_transfers");
        assert_eq!(families[1].name(), "netapp_ontap_disk_online");
        assert_eq!(families[1].get_metric().len(), 2);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let samples = vec![
            Sample::gauge("disk_online", "Disk Online Status", disk_labels("d1", "c1"), 1.0),
            Sample::gauge("disk_online", "Disk Online Status", disk_labels("d1", "c1"), 0.0),
        ];
        let families = to_families(&samples);
        assert_eq!(families[0].get_metric().len(), 1);
        assert_eq!(series_count(&families), 1);
    }

    #[test]
    fn test_encode_text() {
        let samples = vec![Sample::gauge(
            "disk_base_for_disk_busy",
            "Disk busy base counter",
            disk_labels("disk1", "c1"),
            12.5,
        )];
        let text = encode_text(&to_families(&samples)).unwrap();

        assert!(text.contains("# HELP netapp_ontap_disk_base_for_disk_busy Disk busy base counter"));
        assert!(text.contains("# TYPE netapp_ontap_disk_base_for_disk_busy gauge"));
        assert!(text.contains(r#"netapp_ontap_disk_base_for_disk_busy{cluster="c1",disk="disk1"} 12.5"#));
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_text(&to_families(&[])).unwrap(), "");
    }
}
