//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use netapp_ontap_exporter::cli::ConfigFormat;
use netapp_ontap_exporter::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("netapp-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# NetApp ONTAP Exporter Configuration
# ===================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9099                   # HTTP port (env: PORT)
#
# Cluster Connection
# ------------------
# host: null                   # Cluster management address (env: HOST)
# username: null               # API user (env: USERID)
# password: null               # API password (env: PASSWORD)
# debug: false                 # Log API requests and responses (env: DEBUG=True)
# use_ssl: true                # Talk HTTPS to the cluster
# tls_insecure: false          # Skip certificate verification
#
# Collection
# ----------
# volume_max_records: 100      # Volumes fetched per scrape
# collector_timeout_secs: 60   # Per-collector timeout (0 = none)
# request_timeout_secs: 30     # Per-request HTTP timeout
# test_data_file: null         # Serve canned YAML/JSON data instead of a cluster
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
