//! Check command implementation.
//!
//! Runs one scrape against the configured cluster and reports how each
//! collector did.

use netapp_ontap_exporter::Exporter;

/// Runs one scrape and prints per-collector results.
///
/// Exits with status 1 when every collector failed.
pub async fn command_check(exporter: &Exporter, verbose: bool) -> anyhow::Result<()> {
    println!("🔍 NetApp ONTAP Exporter - Cluster Check");
    println!("========================================");

    let scrape = exporter.collect().await;
    let summary = &scrape.summary;

    println!("\n🏷️  Cluster:");
    if summary.cluster.is_empty() {
        println!("   ⚠️  Cluster name could not be resolved (samples carry cluster=\"\")");
    } else {
        println!("   ✅ {}", summary.cluster);
    }

    println!("\n📊 Collectors:");
    for report in &summary.reports {
        if report.is_success() {
            println!(
                "   ✅ {:10} {:>6} samples in {:.3}s",
                report.collector,
                report.samples,
                report.duration.as_secs_f64()
            );
        } else {
            println!(
                "   ❌ {:10} {:>6} samples in {:.3}s",
                report.collector,
                report.samples,
                report.duration.as_secs_f64()
            );
            for err in &report.errors {
                println!("      └─ {}", err);
            }
        }
    }

    if verbose {
        println!("\n📋 Samples:");
        for sample in &scrape.samples {
            let labels: Vec<String> = sample
                .labels
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, v))
                .collect();
            println!(
                "   {}{{{}}} {}",
                sample.name,
                labels.join(","),
                sample.value
            );
        }
    }

    println!("\n📋 Summary:");
    println!(
        "   {} samples from {} collectors in {:.3}s",
        summary.samples(),
        summary.reports.len(),
        summary.duration.as_secs_f64()
    );

    if !summary.reports.is_empty() && summary.failed_collectors() == summary.reports.len() {
        println!("   ❌ Every collector failed - check host and credentials");
        std::process::exit(1);
    }
    if summary.failed_collectors() > 0 {
        println!("   ⚠️  Some collectors reported errors");
    } else {
        println!("   ✅ All collectors succeeded");
    }
    Ok(())
}
