//! netapp-ontap-exporter - version 0.1.0
//!
//! Prometheus exporter for NetApp ONTAP clusters with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod commands;
mod handlers;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use netapp_ontap_exporter::cli::{Args, Commands};
use netapp_ontap_exporter::config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use netapp_ontap_exporter::{Exporter, ExporterMetrics, Orchestrator};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal, sync::RwLock};
use tracing::{debug, error, info};

use commands::{command_check, command_config, command_describe};
use handlers::{health_handler, metrics_handler, root_handler};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so subcommand output on stdout stays machine-readable.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = args.log_level.filter(config.is_debug());

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Builds the scrape entry point for the configured backend.
fn build_exporter(config: &Config) -> anyhow::Result<Arc<Exporter>> {
    let connector = config.connector()?;
    let orchestrator = Orchestrator::new(connector, config.scrape_options());
    debug!(
        "Collectors enabled: {}",
        orchestrator.collector_names().join(", ")
    );
    Ok(Arc::new(Exporter::new(Arc::new(orchestrator))))
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        // Config generation doesn't need a valid config
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);
        let exporter = build_exporter(&config)?;

        return match command {
            Commands::Check { verbose } => command_check(&exporter, *verbose).await,
            Commands::Describe { format } => command_describe(&exporter, format.clone()).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config, &args);

    info!(
        "Starting netapp-ontap-exporter {} ({})",
        netapp_ontap_exporter::telemetry::VERSION,
        netapp_ontap_exporter::telemetry::GIT_SHA
    );

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    match &config.test_data_file {
        Some(path) => info!("Serving test data from {}", path.display()),
        None => info!(
            "Collecting from cluster {}",
            config.host.as_deref().unwrap_or_default()
        ),
    }

    let exporter = build_exporter(&config)?;
    let telemetry = ExporterMetrics::new()?;
    debug!("All self-metrics registered successfully");

    let state: SharedState = Arc::new(AppState {
        exporter,
        telemetry,
        last_scrape: RwLock::new(None),
        start_time: Instant::now(),
    });

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state.clone());

    // These paths are guaranteed to exist since validate_effective_config() was called earlier
    let tls_paths = match (
        config.enable_tls.unwrap_or(false),
        config.tls_cert_path.as_ref(),
        config.tls_key_path.as_ref(),
    ) {
        (true, Some(cert), Some(key)) => Some((cert, key)),
        _ => None,
    };

    if let Some((cert_path, key_path)) = tls_paths {
        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!(
            "netapp-ontap-exporter listening on https://{}:{}",
            bind_ip_str, port
        );

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        // TLS is disabled - use standard TCP listener
        let listener = TcpListener::bind(addr).await?;
        info!(
            "netapp-ontap-exporter listening on http://{}:{}",
            bind_ip_str, port
        );

        let server = axum::serve(listener, app);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal => {
                info!("Shutdown signal received, exiting...");
            }
        }
    }

    info!("netapp-ontap-exporter stopped gracefully");
    Ok(())
}
