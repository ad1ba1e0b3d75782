//! Configuration management for netapp-ontap-exporter.
//!
//! This module handles loading, merging, and validating configuration from files,
//! environment variables and CLI arguments. It supports YAML, JSON, and TOML formats.
//!
//! Precedence: CLI > environment (`HOST`, `USERID`, `PASSWORD`, `DEBUG`, `PORT`)
//! > config file > defaults.

use crate::cli::{Args, ConfigFormat};
use crate::collectors::DEFAULT_VOLUME_MAX_RECORDS;
use crate::ontap::rest::RestSettings;
use crate::ontap::{Connector, FixtureConnector, RestConnector};
use crate::scrape::ScrapeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9099;
pub const DEFAULT_COLLECTOR_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const REDACTED: &str = "********";

/// Startup configuration errors. Any of these stops the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing backend settings: {0}. Set HOST, USERID and PASSWORD (or host/username/password in the config file)")]
    MissingBackend(String),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("volume_max_records must be greater than 0")]
    InvalidVolumeMaxRecords,

    #[error("Test data file not found: {0}")]
    TestDataNotFound(String),

    #[error("TLS is enabled but neither tls_cert_path nor tls_key_path are set")]
    TlsPathsMissing,

    #[error("TLS is enabled but tls_key_path is not set")]
    TlsKeyMissing,

    #[error("TLS is enabled but tls_cert_path is not set")]
    TlsCertMissing,

    #[error("TLS {kind} file not found: {path}")]
    TlsFileNotFound { kind: &'static str, path: String },

    #[error("TLS {kind} file is empty: {path}")]
    TlsFileEmpty { kind: &'static str, path: String },
}

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Backend connection
    pub host: Option<String>,
    #[serde(alias = "userid")]
    pub username: Option<String>,
    pub password: Option<String>,
    pub debug: Option<bool>,
    #[serde(alias = "use-ssl")]
    pub use_ssl: Option<bool>,
    #[serde(alias = "tls-insecure")]
    pub tls_insecure: Option<bool>,

    // Collection
    #[serde(alias = "volume-max-records")]
    pub volume_max_records: Option<usize>,
    /// 0 disables the per-collector timeout
    #[serde(alias = "collector-timeout-secs")]
    pub collector_timeout_secs: Option<u64>,
    #[serde(alias = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,

    /// Path to JSON/YAML test data file (serves canned data instead of a cluster)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // Feature flags
    pub enable_health: Option<bool>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            host: None,
            username: None,
            password: None,
            debug: Some(false),
            use_ssl: Some(true),
            tls_insecure: Some(false),
            volume_max_records: Some(DEFAULT_VOLUME_MAX_RECORDS),
            collector_timeout_secs: Some(DEFAULT_COLLECTOR_TIMEOUT_SECS),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            test_data_file: None,
            enable_health: Some(true),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// Backend settings for the REST client.
    pub fn rest_settings(&self) -> RestSettings {
        RestSettings {
            host: self.host.clone().unwrap_or_default(),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            use_ssl: self.use_ssl.unwrap_or(true),
            tls_insecure: self.tls_insecure.unwrap_or(false),
            debug: self.is_debug(),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        }
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        let timeout_secs = self
            .collector_timeout_secs
            .unwrap_or(DEFAULT_COLLECTOR_TIMEOUT_SECS);
        ScrapeOptions {
            volume_max_records: self
                .volume_max_records
                .unwrap_or(DEFAULT_VOLUME_MAX_RECORDS),
            collector_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    /// Builds the backend connector: canned data when a test data file is
    /// configured, the REST API otherwise.
    pub fn connector(&self) -> anyhow::Result<Arc<dyn Connector>> {
        match &self.test_data_file {
            Some(path) => {
                info!("Using test data from file: {}", path.display());
                Ok(Arc::new(FixtureConnector::from_file(path)?))
            }
            None => Ok(Arc::new(RestConnector::new(self.rest_settings()))),
        }
    }

    /// Copy safe for printing.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if copy.password.is_some() {
            copy.password = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    match &cfg.test_data_file {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::TestDataNotFound(path.display().to_string()));
            }
        }
        None => {
            let missing: Vec<&str> = [
                ("HOST", &cfg.host),
                ("USERID", &cfg.username),
                ("PASSWORD", &cfg.password),
            ]
            .iter()
            .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

            if !missing.is_empty() {
                return Err(ConfigError::MissingBackend(missing.join(", ")));
            }
        }
    }

    if let Some(0) = cfg.port {
        return Err(ConfigError::InvalidPort(0));
    }

    if cfg.volume_max_records == Some(0) {
        return Err(ConfigError::InvalidVolumeMaxRecords);
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        match (cfg.tls_cert_path.as_deref(), cfg.tls_key_path.as_deref()) {
            (None, None) => return Err(ConfigError::TlsPathsMissing),
            (Some(_), None) => return Err(ConfigError::TlsKeyMissing),
            (None, Some(_)) => return Err(ConfigError::TlsCertMissing),
            (Some(cert), Some(key)) => {
                check_tls_file("certificate", cert)?;
                check_tls_file("private key", key)?;
            }
        }
    }

    Ok(())
}

fn check_tls_file(kind: &'static str, path: &str) -> Result<(), ConfigError> {
    match fs::metadata(path) {
        Err(_) => Err(ConfigError::TlsFileNotFound {
            kind,
            path: path.to_string(),
        }),
        Ok(meta) if meta.len() == 0 => Err(ConfigError::TlsFileEmpty {
            kind,
            path: path.to_string(),
        }),
        Ok(_) => Ok(()),
    }
}

/// Applies the environment variables the exporter has always honored.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST").filter(|v| !v.is_empty()) {
        config.host = Some(host);
    }
    if let Some(user) = lookup("USERID").filter(|v| !v.is_empty()) {
        config.username = Some(user);
    }
    if let Some(password) = lookup("PASSWORD").filter(|v| !v.is_empty()) {
        config.password = Some(password);
    }
    if let Some(debug) = lookup("DEBUG") {
        config.debug = Some(debug == "True");
    }
    // A non-numeric PORT is ignored
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
        config.port = Some(port);
    }
}

/// Resolves configuration from CLI args, environment, config file, and defaults.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    apply_args(&mut config, args);

    Ok(config)
}

/// CLI overrides: only flags the user actually supplied win.
pub fn apply_args(config: &mut Config, args: &Args) {
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(host) = &args.host {
        config.host = Some(host.clone());
    }
    if let Some(username) = &args.username {
        config.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        config.password = Some(password.clone());
    }
    if args.debug {
        config.debug = Some(true);
    }
    if args.tls_insecure {
        config.tls_insecure = Some(true);
    }

    if let Some(n) = args.volume_max_records {
        config.volume_max_records = Some(n);
    }
    if let Some(secs) = args.collector_timeout_secs {
        config.collector_timeout_secs = Some(secs);
    }
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/netapp-exporter/netapp-exporter.yaml",
                "/etc/netapp-exporter/netapp-exporter.yml",
                "/etc/netapp-exporter/netapp-exporter.json",
                "/etc/netapp-exporter/netapp-exporter.toml",
                "./netapp-exporter.yaml",
                "./netapp-exporter.yml",
                "./netapp-exporter.json",
                "./netapp-exporter.toml",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let content = fs::read_to_string(&path)?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format, password redacted
pub fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(&config.redacted(), format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap as HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn backend_config() -> Config {
        Config {
            host: Some("filer01".into()),
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..Default::default()
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_backend_is_fatal() {
        let err = validate_effective_config(&Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackend(ref m) if m == "HOST, USERID, PASSWORD"));

        let mut cfg = backend_config();
        cfg.password = Some(String::new());
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackend(ref m) if m == "PASSWORD"));

        assert!(validate_effective_config(&backend_config()).is_ok());
    }

    #[test]
    fn test_port_zero_rejected() {
        let mut cfg = backend_config();
        cfg.port = Some(0);
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        apply_env(
            &mut cfg,
            env(&[
                ("HOST", "filer02"),
                ("USERID", "monitor"),
                ("PASSWORD", "pw"),
                ("DEBUG", "True"),
                ("PORT", "9100"),
            ]),
        );
        assert_eq!(cfg.host.as_deref(), Some("filer02"));
        assert_eq!(cfg.username.as_deref(), Some("monitor"));
        assert!(cfg.is_debug());
        assert_eq!(cfg.port, Some(9100));
    }

    #[test]
    fn test_env_debug_requires_exact_true_and_bad_port_ignored() {
        let mut cfg = Config::default();
        apply_env(&mut cfg, env(&[("DEBUG", "true"), ("PORT", "abc")]));
        assert!(!cfg.is_debug());
        assert_eq!(cfg.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_cli_wins_over_env() {
        let mut cfg = Config::default();
        apply_env(&mut cfg, env(&[("HOST", "from-env"), ("PORT", "9100")]));
        let args = Args {
            host: Some("from-cli".into()),
            port: Some(9200),
            ..Default::default()
        };
        apply_args(&mut cfg, &args);
        assert_eq!(cfg.host.as_deref(), Some("from-cli"));
        assert_eq!(cfg.port, Some(9200));
    }

    #[test]
    fn test_scrape_options() {
        let mut cfg = Config::default();
        let opts = cfg.scrape_options();
        assert_eq!(opts.volume_max_records, 100);
        assert_eq!(opts.collector_timeout, Some(Duration::from_secs(60)));

        cfg.collector_timeout_secs = Some(0);
        assert_eq!(cfg.scrape_options().collector_timeout, None);
    }

    #[test]
    fn test_tls_validation() {
        let mut cfg = backend_config();
        cfg.enable_tls = Some(true);
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::TlsPathsMissing)
        ));

        cfg.tls_cert_path = Some("/nonexistent/cert.pem".into());
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::TlsKeyMissing)
        ));

        cfg.tls_key_path = Some("/nonexistent/key.pem".into());
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::TlsFileNotFound { kind: "certificate", .. })
        ));
    }

    #[test]
    fn test_load_yaml_config() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "host: filer01\nuserid: admin\npassword: secret\nvolume_max_records: 250\n"
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.host.as_deref(), Some("filer01"));
        assert_eq!(cfg.username.as_deref(), Some("admin"));
        assert_eq!(cfg.volume_max_records, Some(250));
        // Unset fields keep their defaults
        assert_eq!(cfg.port, Some(DEFAULT_PORT));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        assert!(load_config(Some(Path::new("/nonexistent/netapp.yaml"))).is_err());
    }

    #[test]
    fn test_redacted() {
        let shown = render_config(&backend_config().redacted(), &ConfigFormat::Json).unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains(REDACTED));
    }
}
