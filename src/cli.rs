//! CLI arguments and subcommands for netapp-ontap-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Subscriber filter for this level. `debug` raises any enabled level to
    /// at least DEBUG; `off` stays off.
    pub fn filter(&self, debug: bool) -> LevelFilter {
        let filter = match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        };
        if debug && filter != LevelFilter::OFF && filter < LevelFilter::DEBUG {
            LevelFilter::DEBUG
        } else {
            filter
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug, Default)]
#[command(
    name = "netapp-ontap-exporter",
    about = "Prometheus exporter for NetApp ONTAP disk, volume and aggregate metrics",
    long_about = "Prometheus exporter for NetApp ONTAP disk, volume and aggregate metrics.\n\n\
                  Every scrape queries the cluster management API concurrently for disk, \
                  volume and aggregate statistics and re-exports them as Prometheus samples.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// ONTAP cluster management address (host or URL)
    #[arg(long)]
    pub host: Option<String>,

    /// ONTAP API user
    #[arg(long)]
    pub username: Option<String>,

    /// ONTAP API password
    #[arg(long)]
    pub password: Option<String>,

    /// Log backend requests and responses
    #[arg(long)]
    pub debug: bool,

    /// Skip certificate verification for the ONTAP API
    #[arg(long)]
    pub tls_insecure: bool,

    /// Maximum number of volumes fetched per scrape
    #[arg(long)]
    pub volume_max_records: Option<usize>,

    /// Per-collector timeout in seconds (0 = no timeout)
    #[arg(long)]
    pub collector_timeout_secs: Option<u64>,

    /// Path to JSON/YAML test data file (serves canned data instead of a cluster)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the cluster, run one scrape and report per-collector results
    Check {
        /// Print every sample
        #[arg(long)]
        verbose: bool,
    },

    /// Run one scrape and list the metrics it produces
    Describe {
        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
