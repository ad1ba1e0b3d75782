//! Describe command implementation.
//!
//! Lists the metrics the cluster currently produces.

use netapp_ontap_exporter::cli::ConfigFormat;
use netapp_ontap_exporter::Exporter;

/// Prints the distinct metric descriptors of one scrape.
pub async fn command_describe(exporter: &Exporter, format: ConfigFormat) -> anyhow::Result<()> {
    let descriptors = exporter.describe().await;

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&descriptors)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&descriptors)?,
        ConfigFormat::Toml => {
            // TOML has no top-level arrays
            #[derive(serde::Serialize)]
            struct Metrics<'a> {
                metric: &'a [netapp_ontap_exporter::MetricDescriptor],
            }
            toml::to_string_pretty(&Metrics {
                metric: &descriptors,
            })?
        }
    };

    print!("{}", content);
    Ok(())
}
