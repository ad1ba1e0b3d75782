//! End-to-end scrape tests.
//!
//! These drive the full pipeline (orchestrator, collectors, exposition)
//! against canned cluster data served by `FixtureConnector`.

use netapp_ontap_exporter::exposition::{encode_text, to_families};
use netapp_ontap_exporter::ontap::Endpoint;
use netapp_ontap_exporter::{
    DiskInfo, Exporter, FixtureConnector, FixtureData, MetricKind, Orchestrator, PerfCounter,
    Sample, ScrapeOptions, VolumeInfo,
};
use std::path::Path;
use std::sync::Arc;

/// Helper to build a full data set touching all three collectors.
fn cluster_data() -> FixtureData {
    FixtureData {
        cluster_name: "cluster1".into(),
        disk_perf: vec![
            PerfCounter::new("disk1", "base_for_disk_busy", "12.5"),
            PerfCounter::new("disk1", "disk_busy", "3"),
        ],
        disk_info: vec![DiskInfo {
            name: "disk1".into(),
            online: true,
            spare: false,
            prefailed: false,
        }],
        volume_aggr: vec![("vol1".into(), "aggr1".into())],
        volume_perf: vec![PerfCounter::new("vol1", "read_ops", "100")],
        volume_info: vec![VolumeInfo {
            name: "vol1".into(),
            aggr: "aggr1".into(),
            state: "online".into(),
            size_total: "1000".into(),
            size_used: "400".into(),
            size_free: "600".into(),
            snap_percent_used: "1".into(),
            snap_percent_reserve: "5".into(),
        }],
        aggr_perf: vec![PerfCounter::new("aggr1", "total_transfers", "42")],
        ..Default::default()
    }
}

fn exporter_for(data: FixtureData) -> (Exporter, FixtureConnector) {
    let connector = FixtureConnector::new(data);
    let orchestrator = Orchestrator::new(Arc::new(connector.clone()), ScrapeOptions::default());
    (Exporter::new(Arc::new(orchestrator)), connector)
}

fn find<'a>(samples: &'a [Sample], name: &str, label: (&str, &str)) -> Vec<&'a Sample> {
    samples
        .iter()
        .filter(|s| s.name == name && s.label(label.0) == Some(label.1))
        .collect()
}

#[tokio::test]
async fn test_disk_busy_base_counter_keeps_disk_prefix() {
    let (exporter, _) = exporter_for(cluster_data());
    let scrape = exporter.collect().await;

    let base = find(
        &scrape.samples,
        "netapp_ontap_disk_base_for_disk_busy",
        ("disk", "disk1"),
    );
    assert_eq!(base.len(), 1);
    assert_eq!(base[0].kind, MetricKind::Gauge);
    assert_eq!(base[0].value, 12.5);
    assert_eq!(base[0].label("cluster"), Some("cluster1"));
    assert_eq!(base[0].labels.len(), 2);

    // Other disk counters are exported under their bare name
    let busy = find(&scrape.samples, "netapp_ontap_disk_busy", ("disk", "disk1"));
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].value, 3.0);
}

#[tokio::test]
async fn test_disk_state_gauges() {
    let (exporter, _) = exporter_for(cluster_data());
    let scrape = exporter.collect().await;

    for (name, expected) in [
        ("netapp_ontap_disk_online", 1.0),
        ("netapp_ontap_disk_spare", 0.0),
        ("netapp_ontap_disk_prefailed", 0.0),
    ] {
        let found = find(&scrape.samples, name, ("disk", "disk1"));
        assert_eq!(found.len(), 1, "{}", name);
        assert_eq!(found[0].kind, MetricKind::Gauge);
        assert_eq!(found[0].value, expected, "{}", name);
    }
}

#[tokio::test]
async fn test_volume_perf_survives_failed_aggr_lookup() {
    let data = cluster_data().failing(Endpoint::VolumeToAggrMap);
    let (exporter, _) = exporter_for(data);
    let scrape = exporter.collect().await;

    let perf = find(&scrape.samples, "netapp_ontap_volume_read_ops", ("volume", "vol1"));
    assert_eq!(perf.len(), 1);
    assert_eq!(perf[0].label("aggr"), Some(""));
    assert_eq!(perf[0].kind, MetricKind::Counter);
    assert_eq!(perf[0].value, 100.0);

    let volume = scrape
        .summary
        .reports
        .iter()
        .find(|r| r.collector == "volume")
        .unwrap();
    assert_eq!(volume.errors.len(), 1);
}

#[tokio::test]
async fn test_failed_cluster_identity_empties_cluster_label() {
    let data = cluster_data().failing(Endpoint::ClusterIdentity);
    let (exporter, _) = exporter_for(data);
    let scrape = exporter.collect().await;

    assert_eq!(scrape.summary.cluster, "");
    assert!(!scrape.samples.is_empty());
    for sample in &scrape.samples {
        assert_eq!(sample.label("cluster"), Some(""), "{}", sample.name);
    }

    let collectors: Vec<_> = scrape.summary.reports.iter().map(|r| r.collector).collect();
    assert_eq!(collectors.len(), 3);
    assert!(scrape.summary.reports.iter().all(|r| r.is_success()));
}

#[tokio::test]
async fn test_sample_total_is_sum_of_collectors() {
    let (exporter, connector) = exporter_for(cluster_data());
    let scrape = exporter.collect().await;

    // disk: 2 perf + 3 state, volume: 1 perf + 6 info, aggregate: 1
    assert_eq!(scrape.samples.len(), 13);
    assert_eq!(scrape.summary.samples(), scrape.samples.len());

    let per_collector: Vec<(&str, usize)> = scrape
        .summary
        .reports
        .iter()
        .map(|r| (r.collector, r.samples))
        .collect();
    for (collector, expected) in [("disk", 5), ("volume", 7), ("aggregate", 1)] {
        assert!(
            per_collector.contains(&(collector, expected)),
            "{:?}",
            per_collector
        );
    }

    // Identity lookup plus one connection per collector
    assert_eq!(connector.connections(), 4);
}

#[tokio::test]
async fn test_failed_fetch_leaves_other_collectors_untouched() {
    let (healthy, _) = exporter_for(cluster_data());
    let baseline = healthy.collect().await.summary;

    for endpoint in [Endpoint::AggrPerf, Endpoint::DiskPerf] {
        let (exporter, _) = exporter_for(cluster_data().failing(endpoint));
        let summary = exporter.collect().await.summary;
        assert_eq!(summary.reports.len(), 3);

        for report in &summary.reports {
            let expected = baseline
                .reports
                .iter()
                .find(|r| r.collector == report.collector)
                .unwrap();
            let owner = match endpoint {
                Endpoint::AggrPerf => "aggregate",
                _ => "disk",
            };
            if report.collector == owner {
                assert!(!report.is_success(), "{:?}", endpoint);
                assert!(report.samples < expected.samples);
            } else {
                assert!(report.is_success(), "{} with {:?}", report.collector, endpoint);
                assert_eq!(report.samples, expected.samples, "{}", report.collector);
            }
        }
    }
}

#[tokio::test]
async fn test_all_endpoints_failing_still_completes() {
    let mut data = cluster_data();
    data.failing = vec![
        Endpoint::ClusterIdentity,
        Endpoint::DiskPerf,
        Endpoint::DiskInfo,
        Endpoint::VolumeToAggrMap,
        Endpoint::VolumePerf,
        Endpoint::VolumeInfo,
        Endpoint::AggrPerf,
    ];
    let (exporter, _) = exporter_for(data);
    let scrape = exporter.collect().await;

    assert!(scrape.samples.is_empty());
    assert_eq!(scrape.summary.failed_collectors(), 3);
    assert!(!exporter.is_collecting());
}

#[tokio::test]
async fn test_concurrent_scrapes_are_independent() {
    let (exporter, connector) = exporter_for(cluster_data());
    let exporter = Arc::new(exporter);

    let a = tokio::spawn({
        let exporter = exporter.clone();
        async move { exporter.collect().await }
    });
    let b = tokio::spawn({
        let exporter = exporter.clone();
        async move { exporter.collect().await }
    });

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(a.samples.len(), 13);
    assert_eq!(b.samples.len(), 13);
    assert_eq!(connector.connections(), 8);
}

#[tokio::test]
async fn test_text_exposition() {
    let (exporter, _) = exporter_for(cluster_data());
    let scrape = exporter.collect().await;
    let text = encode_text(&to_families(&scrape.samples)).unwrap();

    assert!(text.contains("# TYPE netapp_ontap_disk_base_for_disk_busy gauge"));
    assert!(text.contains("# TYPE netapp_ontap_volume_read_ops counter"));
    assert!(text.contains("# HELP netapp_ontap_aggr_total_transfers Aggregate Performance counter total_transfers"));
    assert!(text.contains(
        r#"netapp_ontap_volume_size_used{aggr="aggr1",cluster="cluster1",volume="vol1"} 400"#
    ));
    assert!(text.contains(r#"netapp_ontap_volume_state{aggr="aggr1",cluster="cluster1",volume="vol1"} 1"#));
}

#[tokio::test]
async fn test_demo_fixture_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/fixture.yaml");
    let connector = FixtureConnector::from_file(&path).unwrap();
    let orchestrator = Orchestrator::new(Arc::new(connector), ScrapeOptions::default());
    let exporter = Exporter::new(Arc::new(orchestrator));

    let scrape = exporter.collect().await;
    assert_eq!(scrape.summary.cluster, "cluster1");
    assert_eq!(scrape.summary.failed_collectors(), 0);
    assert_eq!(scrape.samples.len(), 27);

    // data01 has no aggr in its info record; the map supplies it
    let state = find(&scrape.samples, "netapp_ontap_volume_state", ("volume", "data01"));
    assert_eq!(state[0].label("aggr"), Some("aggr1"));
    assert_eq!(state[0].value, 0.0);
}
